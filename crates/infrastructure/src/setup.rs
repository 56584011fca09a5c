use domain::{lookup_carrier, Address, CarrierProfile, ContactPerson, Seller, Shipment};
use serde::de::DeserializeOwned;
use shared::AppError;
use tracing::debug;

use crate::ims::ImsApi;

/// 解決済みの運送会社セットアップ
#[derive(Debug, Clone)]
pub struct ResolvedSetup<T> {
    pub setup: T,
    /// セラー経由で解決した場合のセラー
    pub seller: Option<Seller>,
}

/// 差出人（セラー、またはセラーがなければ IMS コンテキスト）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sender {
    pub address: Address,
    pub contact_person: Option<ContactPerson>,
}

/// 出荷に適用する運送会社セットアップを解決
///
/// セラーがあればセラーのデータドキュメントから、なければ IMS 上の
/// 運送会社レコードのデータドキュメントから読み取る。
pub async fn resolve_setup<T, I>(
    ims: &I,
    shipment: &Shipment,
    profile: CarrierProfile,
) -> Result<ResolvedSetup<T>, AppError>
where
    T: DeserializeOwned,
    I: ImsApi + ?Sized,
{
    match shipment.seller_id {
        Some(seller_id) => {
            debug!(seller_id, carrier = %profile, "Resolving setup from seller");
            let seller = ims.get_seller(seller_id).await?;
            let setup = profile.read_setup(seller.data_document.as_deref())?;
            Ok(ResolvedSetup {
                setup,
                seller: Some(seller),
            })
        }
        None => {
            debug!(carrier = %profile, "Resolving setup from carrier record");
            let carriers = ims.get_carriers().await?;
            let carrier = lookup_carrier(&carriers, profile.carrier_name())?;
            let setup = profile.read_setup(carrier.data_document.as_deref())?;
            Ok(ResolvedSetup { setup, seller: None })
        }
    }
}

/// 差出人を解決
pub async fn resolve_sender<I>(ims: &I, seller: Option<&Seller>, context_id: i64) -> Result<Sender, AppError>
where
    I: ImsApi + ?Sized,
{
    match seller {
        Some(seller) => Ok(Sender {
            address: seller.address.clone(),
            contact_person: seller.contact_person.clone(),
        }),
        None => {
            let context = ims.get_context(context_id).await?;
            Ok(Sender {
                address: context.address,
                contact_person: context.contact_person,
            })
        }
    }
}
