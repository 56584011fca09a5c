use chrono::NaiveDate;
use domain::{Attachment, BookingDetail, CarrierProfile, GlsSetup, ShippingContainer};
use infrastructure::{
    resolve_sender, resolve_setup, BookingResult, CarrierResponse, GlsApi, GlsShipmentResponse, ImsApi,
};
use shared::AppError;
use tracing::{error, info, warn};

use crate::mapping::{gls_shipment, tracking_url};

/// GLS に出荷を登録し、追跡番号を IMS に書き戻す
pub async fn book<I, G>(
    ims: &I,
    gls: &G,
    detail: &BookingDetail,
    shipment_date: NaiveDate,
) -> Result<BookingResult, AppError>
where
    I: ImsApi + ?Sized,
    G: GlsApi + ?Sized,
{
    let (_, shipment) = ims.get_shipment(detail.shipment_id).await?;
    let resolved = resolve_setup::<GlsSetup, _>(ims, &shipment, CarrierProfile::Gls).await?;
    let sender = resolve_sender(ims, resolved.seller.as_ref(), detail.context_id).await?;

    let request = gls_shipment(&resolved.setup, &shipment, &sender, shipment_date);
    info!(
        shipment_number = %shipment.shipment_number,
        parcels = request.parcels.len(),
        "Registering shipment with GLS"
    );

    match gls.create_shipment(&request).await? {
        CarrierResponse::Accepted(response) => {
            // 登録後の失敗は再試行させない
            if let Err(error) = write_back(ims, shipment.id, &shipment.shipping_containers, &response).await {
                error!(
                    error = %error,
                    shipment_number = %shipment.shipment_number,
                    consignment_id = %response.consignment_id,
                    "Shipment registered but tracking could not be written back"
                );
                return Ok(BookingResult::Failed(format!(
                    "Shipment {} was registered with GLS as consignment {}, but could not be completed: {}",
                    shipment.shipment_number, response.consignment_id, error
                )));
            }
            Ok(BookingResult::Label(Attachment::shipping_label(
                detail.document_id,
                response.pdf,
            )))
        }
        CarrierResponse::Rejected(reason) => Ok(BookingResult::Failed(format!(
            "Failed to register shipment {} with GLS. GLS says: {}",
            shipment.shipment_number, reason
        ))),
        CarrierResponse::ServerError(status) => {
            warn!(status, "GLS internal error");
            Ok(BookingResult::Failed(format!(
                "Failed to register shipment {} with GLS due to internal error on their server.",
                shipment.shipment_number
            )))
        }
    }
}

async fn write_back<I>(
    ims: &I,
    shipment_id: i64,
    containers: &[ShippingContainer],
    response: &GlsShipmentResponse,
) -> Result<(), AppError>
where
    I: ImsApi + ?Sized,
{
    if containers.len() != response.parcels.len() {
        warn!(
            containers = containers.len(),
            parcels = response.parcels.len(),
            "GLS returned a different number of parcels"
        );
    }

    for (container, parcel) in containers.iter().zip(&response.parcels) {
        ims.update_tracking(
            container.id,
            &parcel.parcel_number,
            &tracking_url(&parcel.parcel_number),
        )
        .await?;
    }
    ims.set_carriers_shipment_number(shipment_id, &response.consignment_id)
        .await
}
