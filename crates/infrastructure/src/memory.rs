//! テスト用のインメモリ実装

use async_trait::async_trait;
use domain::{
    Attachment, Carrier, Context, DataExtension, DfSetup, EventMessage, Seller, WorkStatus,
};
use serde_json::Value;
use shared::AppError;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::df::{DfApi, DfConsignment, DfConsignmentResponse};
use crate::gls::{GlsApi, GlsShipment, GlsShipmentResponse};
use crate::http::CarrierResponse;
use crate::ims::ImsApi;

/// IMS の状態と、書き込み操作の記録
#[derive(Debug, Clone, Default)]
pub struct ImsState {
    pub shipments: HashMap<i64, Value>,
    pub sellers: HashMap<i64, Seller>,
    pub contexts: HashMap<i64, Context>,
    pub carriers: Vec<Carrier>,
    pub data_extensions: Vec<DataExtension>,

    pub work_statuses: Vec<(i64, WorkStatus)>,
    pub attachments: Vec<(i64, Attachment)>,
    pub messages: Vec<(i64, EventMessage)>,
    pub tracking: Vec<(i64, String, String)>,
    pub carriers_shipment_numbers: Vec<(i64, String)>,
    pub schema_updates: Vec<(i64, String)>,
}

/// 障害を注入できる IMS の書き込み操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImsWrite {
    Attachment,
    EventMessage,
    Tracking,
}

#[derive(Debug, Default)]
pub struct InMemoryIms {
    state: Mutex<ImsState>,
    next_id: Mutex<i64>,
    failing: HashSet<ImsWrite>,
}

impl InMemoryIms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shipment(self, shipment: Value) -> Self {
        let id = shipment.get("id").and_then(Value::as_i64).unwrap_or_default();
        self.lock().shipments.insert(id, shipment);
        self
    }

    pub fn with_seller(self, seller: Seller) -> Self {
        self.lock().sellers.insert(seller.id, seller);
        self
    }

    pub fn with_context(self, context: Context) -> Self {
        self.lock().contexts.insert(context.id, context);
        self
    }

    pub fn with_carrier(self, carrier: Carrier) -> Self {
        self.lock().carriers.push(carrier);
        self
    }

    pub fn with_data_extension(self, data_extension: DataExtension) -> Self {
        self.lock().data_extensions.push(data_extension);
        self
    }

    /// 指定した書き込みを `AppError::Network` で失敗させる
    pub fn failing(mut self, operation: ImsWrite) -> Self {
        self.failing.insert(operation);
        self
    }

    /// 現在の状態のスナップショット
    pub fn snapshot(&self) -> ImsState {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ImsState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn allocate_id(&self) -> i64 {
        let mut next = self.next_id.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *next += 1;
        1000 + *next
    }
}

fn not_found(path: String) -> AppError {
    AppError::NotFound(path)
}

impl InMemoryIms {
    fn check(&self, operation: ImsWrite) -> Result<(), AppError> {
        if self.failing.contains(&operation) {
            return Err(AppError::Network(format!("{operation:?} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl ImsApi for InMemoryIms {
    async fn get_shipment_json(&self, shipment_id: i64) -> Result<Value, AppError> {
        self.lock()
            .shipments
            .get(&shipment_id)
            .cloned()
            .ok_or_else(|| not_found(format!("shipments/{shipment_id}")))
    }

    async fn get_seller(&self, seller_id: i64) -> Result<Seller, AppError> {
        self.lock()
            .sellers
            .get(&seller_id)
            .cloned()
            .ok_or_else(|| not_found(format!("sellers/{seller_id}")))
    }

    async fn get_context(&self, context_id: i64) -> Result<Context, AppError> {
        self.lock()
            .contexts
            .get(&context_id)
            .cloned()
            .ok_or_else(|| not_found(format!("contexts/{context_id}")))
    }

    async fn get_carriers(&self) -> Result<Vec<Carrier>, AppError> {
        Ok(self.lock().carriers.clone())
    }

    async fn create_carrier(&self, carrier: &Carrier) -> Result<(), AppError> {
        let id = self.allocate_id();
        self.lock().carriers.push(Carrier {
            id: Some(id),
            ..carrier.clone()
        });
        Ok(())
    }

    async fn get_data_extensions(&self) -> Result<Vec<DataExtension>, AppError> {
        Ok(self.lock().data_extensions.clone())
    }

    async fn create_data_extension(&self, data_extension: &DataExtension) -> Result<(), AppError> {
        let id = self.allocate_id();
        self.lock().data_extensions.push(DataExtension {
            id: Some(id),
            ..data_extension.clone()
        });
        Ok(())
    }

    async fn update_data_schema(&self, data_extension_id: i64, data_schema: &str) -> Result<(), AppError> {
        let mut state = self.lock();
        let extension = state
            .data_extensions
            .iter_mut()
            .find(|extension| extension.id == Some(data_extension_id))
            .ok_or_else(|| not_found(format!("dataExtensions/{data_extension_id}")))?;
        extension.data_schema = data_schema.to_string();
        state
            .schema_updates
            .push((data_extension_id, data_schema.to_string()));
        Ok(())
    }

    async fn set_work_status(&self, document_id: i64, status: WorkStatus) -> Result<(), AppError> {
        self.lock().work_statuses.push((document_id, status));
        Ok(())
    }

    async fn attach_to_document(&self, document_id: i64, attachment: &Attachment) -> Result<(), AppError> {
        self.check(ImsWrite::Attachment)?;
        self.lock().attachments.push((document_id, attachment.clone()));
        Ok(())
    }

    async fn post_event_message(&self, event_id: i64, message: &EventMessage) -> Result<(), AppError> {
        self.check(ImsWrite::EventMessage)?;
        self.lock().messages.push((event_id, message.clone()));
        Ok(())
    }

    async fn update_tracking(
        &self,
        shipping_container_id: i64,
        tracking_number: &str,
        tracking_url: &str,
    ) -> Result<(), AppError> {
        self.check(ImsWrite::Tracking)?;
        self.lock().tracking.push((
            shipping_container_id,
            tracking_number.to_string(),
            tracking_url.to_string(),
        ));
        Ok(())
    }

    async fn set_carriers_shipment_number(&self, shipment_id: i64, number: &str) -> Result<(), AppError> {
        self.lock()
            .carriers_shipment_numbers
            .push((shipment_id, number.to_string()));
        Ok(())
    }
}

/// 固定のレスポンスを返し、送信内容を記録する GLS スタブ
#[derive(Debug)]
pub struct StubGls {
    response: CarrierResponse<GlsShipmentResponse>,
    requests: Mutex<Vec<GlsShipment>>,
}

impl StubGls {
    pub fn new(response: CarrierResponse<GlsShipmentResponse>) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GlsShipment> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl GlsApi for StubGls {
    async fn create_shipment(
        &self,
        shipment: &GlsShipment,
    ) -> Result<CarrierResponse<GlsShipmentResponse>, AppError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(shipment.clone());
        Ok(self.response.clone())
    }
}

/// 固定のレスポンスとラベルを返し、送信内容を記録する DF スタブ
#[derive(Debug)]
pub struct StubDf {
    response: CarrierResponse<DfConsignmentResponse>,
    label: Result<String, AppError>,
    requests: Mutex<Vec<(DfSetup, DfConsignment)>>,
}

impl StubDf {
    pub fn new(response: CarrierResponse<DfConsignmentResponse>, label: &str) -> Self {
        Self {
            response,
            label: Ok(label.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// ラベル取得をエラーにする
    pub fn with_label_error(mut self, error: AppError) -> Self {
        self.label = Err(error);
        self
    }

    pub fn requests(&self) -> Vec<(DfSetup, DfConsignment)> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl DfApi for StubDf {
    async fn create_consignment(
        &self,
        setup: &DfSetup,
        consignment: &DfConsignment,
    ) -> Result<CarrierResponse<DfConsignmentResponse>, AppError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((setup.clone(), consignment.clone()));
        Ok(self.response.clone())
    }

    async fn fetch_label(&self, _setup: &DfSetup, _consignment_number: &str) -> Result<String, AppError> {
        self.label.clone()
    }
}
