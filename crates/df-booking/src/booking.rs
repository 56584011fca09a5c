use domain::{find_instruction, Attachment, BookingDetail, CarrierProfile, DfSetup, DomainError, Shipment};
use infrastructure::{
    resolve_sender, resolve_setup, BookingResult, CarrierResponse, DfApi, DfConsignmentResponse, ImsApi,
};
use shared::AppError;
use tracing::{error, info, warn};

use crate::mapping::{df_consignment, ShippingAttributes};

/// 出荷指示を選択して DF に貨物を登録し、ラベルと追跡番号を取得する
pub async fn book<I, D>(ims: &I, df: &D, detail: &BookingDetail) -> Result<BookingResult, AppError>
where
    I: ImsApi + ?Sized,
    D: DfApi + ?Sized,
{
    let (raw_shipment, shipment) = ims.get_shipment(detail.shipment_id).await?;
    let resolved = resolve_setup::<DfSetup, _>(ims, &shipment, CarrierProfile::Df).await?;
    let setup = &resolved.setup;

    let malformed = setup.instructions.iter().filter(|instruction| instruction.is_malformed()).count();
    if malformed > 0 {
        warn!(malformed, "Shipping instructions with a non-object pattern are skipped");
    }

    // マッチングは IMS から受け取った出荷 JSON 全体に対して行う
    let attributes = match find_instruction(&setup.instructions, &raw_shipment) {
        Ok(attributes) => ShippingAttributes::from_attributes(attributes)?,
        Err(DomainError::InstructionNotFound(evaluated)) => {
            info!(shipment_number = %shipment.shipment_number, evaluated, "No shipping instruction matched");
            return Ok(BookingResult::Failed(format!(
                "No shipping instruction matches shipment {}",
                shipment.shipment_number
            )));
        }
        Err(other) => return Err(other.into()),
    };

    let sender = resolve_sender(ims, resolved.seller.as_ref(), detail.context_id).await?;
    let consignment = df_consignment(&shipment, &sender, attributes);
    info!(
        shipment_number = %shipment.shipment_number,
        product_code = %consignment.product_code,
        "Registering consignment with DF"
    );

    match df.create_consignment(setup, &consignment).await? {
        CarrierResponse::Accepted(response) => {
            // 登録後の失敗は再試行させない
            match finish_consignment(ims, df, setup, &shipment, &response).await {
                Ok(label) => Ok(BookingResult::Label(Attachment::shipping_label(detail.document_id, label))),
                Err(error) => {
                    error!(
                        error = %error,
                        shipment_number = %shipment.shipment_number,
                        consignment_number = %response.consignment_number,
                        "Consignment registered but could not be completed"
                    );
                    Ok(BookingResult::Failed(format!(
                        "Shipment {} was registered with DF as consignment {}, but could not be completed: {}",
                        shipment.shipment_number, response.consignment_number, error
                    )))
                }
            }
        }
        CarrierResponse::Rejected(reason) => Ok(BookingResult::Failed(format!(
            "Failed to register shipment {} with DF. DF says: {}",
            shipment.shipment_number, reason
        ))),
        CarrierResponse::ServerError(status) => {
            warn!(status, "DF internal error");
            Ok(BookingResult::Failed(format!(
                "Failed to register shipment {} with DF due to internal error on their server.",
                shipment.shipment_number
            )))
        }
    }
}

/// ラベルを取得し、追跡番号と貨物番号を IMS に書き戻す
async fn finish_consignment<I, D>(
    ims: &I,
    df: &D,
    setup: &DfSetup,
    shipment: &Shipment,
    response: &DfConsignmentResponse,
) -> Result<String, AppError>
where
    I: ImsApi + ?Sized,
    D: DfApi + ?Sized,
{
    let label = df.fetch_label(setup, &response.consignment_number).await?;

    for (container, parcel) in shipment.shipping_containers.iter().zip(&response.parcels) {
        ims.update_tracking(
            container.id,
            &parcel.parcel_number,
            parcel.tracking_url.as_deref().unwrap_or_default(),
        )
        .await?;
    }
    ims.set_carriers_shipment_number(shipment.id, &response.consignment_number)
        .await?;

    Ok(label)
}
