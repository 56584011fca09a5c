mod booking;
mod mapping;

use aws_lambda_events::event::eventbridge::EventBridgeEvent;
use chrono::Local;
use domain::BookingDetail;
use infrastructure::{build_http_client, process_booking, GlsClient, ImsClient};
use lambda_runtime::{run, service_fn, Context, Error, LambdaEvent};
use shared::lambda_error::LambdaErrorHandler;
use shared::{handle_eventbridge_error, init_tracing, trace_lambda_handler, Config, TokenCache};
use std::sync::Arc;
use tracing::{error, info};

const SOURCE: &str = "GLSTransport";

/// 呼び出し間で共有するクライアント
struct AppState {
    ims: ImsClient,
    gls: GlsClient,
}

async fn function_handler(
    event: LambdaEvent<EventBridgeEvent<BookingDetail>>,
    state: Arc<AppState>,
) -> Result<String, Error> {
    let request_id = LambdaErrorHandler::extract_request_id(&event);
    let (payload, context) = event.into_parts();

    trace_lambda_handler!(
        "gls-booking",
        payload,
        context,
        |payload: EventBridgeEvent<BookingDetail>, _context: Context| async move {
            let detail = payload.detail;
            info!(
                document_id = detail.document_id,
                shipment_id = detail.shipment_id,
                "Booking shipment with GLS"
            );

            let today = Local::now().date_naive();
            let booking = booking::book(&state.ims, &state.gls, &detail, today);
            handle_eventbridge_error!(
                process_booking(&state.ims, &detail, SOURCE, booking).await,
                request_id
            );

            Ok::<_, Error>("done".to_string())
        }
    )
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize tracing: {e}");
    }

    let config = Config::from_env().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;
    let http = build_http_client(&config)?;
    let tokens = Arc::new(TokenCache::new());

    let state = Arc::new(AppState {
        ims: ImsClient::new(&config, http.clone(), tokens),
        gls: GlsClient::new(&config, http),
    });

    info!(environment = %config.environment, "GLS booking handler starting");
    run(service_fn(|event| function_handler(event, state.clone()))).await
}
