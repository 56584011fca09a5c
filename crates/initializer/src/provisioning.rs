use domain::{Carrier, CarrierProfile, DataExtension};
use infrastructure::ImsApi;
use serde_json::Value;
use shared::lambda_error::LambdaErrorHandler;
use shared::AppError;
use tracing::info;

use crate::resource::{CustomResourceRequest, CustomResourceResponse, RequestType, ResponseSender};

const SELLER_ENTITY: &str = "seller";

/// IMS に運送会社とセラー向けデータ拡張を登録・更新する
pub struct Provisioner {
    pub profile: CarrierProfile,
    /// セラーを持たない出荷で使う既定セットアップ
    pub default_setup: Value,
}

impl Provisioner {
    pub fn new(profile: CarrierProfile, default_setup: Value) -> Self {
        Self {
            profile,
            default_setup,
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `CARRIER`（GLS | DF）と `DEFAULT_CARRIER_SETUP`（JSON オブジェクト）を読む
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let carrier = lookup("CARRIER")
            .ok_or_else(|| AppError::Configuration("CARRIER is not set".to_string()))?;
        let profile = CarrierProfile::from_string(&carrier)
            .map_err(|e| AppError::Configuration(e.to_string()))?;

        let default_setup = match lookup("DEFAULT_CARRIER_SETUP") {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str::<Value>(&raw)
                .map_err(|e| AppError::Configuration(format!("DEFAULT_CARRIER_SETUP: {e}")))?,
            _ => Value::Object(Default::default()),
        };
        if !default_setup.is_object() {
            return Err(AppError::Configuration(
                "DEFAULT_CARRIER_SETUP must be a JSON object".to_string(),
            ));
        }

        Ok(Self::new(profile, default_setup))
    }

    pub async fn provision<I>(&self, ims: &I, request_type: RequestType) -> Result<(), AppError>
    where
        I: ImsApi + ?Sized,
    {
        match request_type {
            RequestType::Create => {
                let carrier = Carrier {
                    id: None,
                    carrier_name: self.profile.carrier_name().to_string(),
                    data_document: Some(self.profile.wrap_setup(&self.default_setup)),
                };
                ims.create_carrier(&carrier).await?;
                ims.create_data_extension(&self.data_extension()).await?;
                info!(carrier = %self.profile, "Carrier and data extension created");
            }
            RequestType::Update => {
                let extensions = ims.get_data_extensions().await?;
                let existing = extensions.iter().find(|extension| {
                    extension.entity_name == SELLER_ENTITY
                        && extension.data_extension_name == self.profile.data_extension_name()
                });

                match existing.and_then(|extension| extension.id) {
                    Some(id) => {
                        ims.update_data_schema(id, &self.data_schema()).await?;
                        info!(data_extension_id = id, "Data extension schema updated");
                    }
                    None => {
                        ims.create_data_extension(&self.data_extension()).await?;
                        info!(carrier = %self.profile, "Data extension created");
                    }
                }
            }
            RequestType::Delete => {
                info!(carrier = %self.profile, "Stack deleted, IMS left unchanged");
            }
        }
        Ok(())
    }

    /// プロビジョニングを行い、結果にかかわらず SUCCESS を返送する
    pub async fn handle<I, S>(
        &self,
        ims: &I,
        sender: &S,
        request: &CustomResourceRequest,
    ) -> Result<CustomResourceResponse, AppError>
    where
        I: ImsApi + ?Sized,
        S: ResponseSender + ?Sized,
    {
        let reason = match self.provision(ims, request.request_type).await {
            Ok(()) => "OK".to_string(),
            Err(error) => {
                LambdaErrorHandler::log_error(&error, None);
                error.to_string()
            }
        };

        let response =
            CustomResourceResponse::success(request, self.profile.data_extension_name(), reason);
        sender.send(&request.response_url, &response).await?;
        Ok(response)
    }

    fn data_schema(&self) -> String {
        self.profile.data_schema().to_string()
    }

    fn data_extension(&self) -> DataExtension {
        DataExtension {
            id: None,
            entity_name: SELLER_ENTITY.to_string(),
            data_extension_name: self.profile.data_extension_name().to_string(),
            data_schema: self.data_schema(),
        }
    }
}
