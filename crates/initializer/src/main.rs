mod provisioning;
mod resource;

use infrastructure::{build_http_client, ImsClient};
use lambda_runtime::{run, service_fn, Context, Error, LambdaEvent};
use provisioning::Provisioner;
use resource::{CustomResourceRequest, CustomResourceResponse, HttpResponseSender, ResponseSender};
use shared::lambda_error::LambdaErrorHandler;
use shared::{init_tracing, trace_lambda_handler, AppError, Config, TokenCache};
use std::sync::Arc;
use tracing::{error, info};

const FALLBACK_RESOURCE_ID: &str = "CarrierInitializer";

struct Initializer {
    ims: ImsClient,
    provisioner: Provisioner,
}

struct AppState {
    /// 設定不備でも CloudFormation には応答する必要があるため Result のまま保持
    initializer: Result<Initializer, AppError>,
    sender: HttpResponseSender,
}

fn build_initializer() -> Result<Initializer, AppError> {
    let config = Config::from_env()?;
    let http = build_http_client(&config)?;
    Ok(Initializer {
        ims: ImsClient::new(&config, http, Arc::new(TokenCache::new())),
        provisioner: Provisioner::from_env()?,
    })
}

async fn function_handler(
    event: LambdaEvent<CustomResourceRequest>,
    state: Arc<AppState>,
) -> Result<(), Error> {
    let (request, context) = event.into_parts();

    trace_lambda_handler!(
        "initializer",
        request,
        context,
        |request: CustomResourceRequest, _context: Context| async move {
            info!(
                request_type = ?request.request_type,
                logical_resource_id = %request.logical_resource_id,
                "Custom resource request received"
            );

            let result = match &state.initializer {
                Ok(initializer) => initializer
                    .provisioner
                    .handle(&initializer.ims, &state.sender, &request)
                    .await
                    .map(|_| ()),
                Err(error) => {
                    let response =
                        CustomResourceResponse::success(&request, FALLBACK_RESOURCE_ID, error.to_string());
                    state.sender.send(&request.response_url, &response).await
                }
            };

            result.map_err(|e| {
                LambdaErrorHandler::log_error(&e, None);
                Error::from(e)
            })
        }
    )
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize tracing: {e}");
    }

    let initializer = build_initializer();
    if let Err(e) = &initializer {
        error!(error = %e, "Initializer is not configured, requests will be acknowledged with the error");
    }

    let state = Arc::new(AppState {
        initializer,
        sender: HttpResponseSender::new(reqwest::Client::new()),
    });

    run(service_fn(|event| function_handler(event, state.clone()))).await
}
