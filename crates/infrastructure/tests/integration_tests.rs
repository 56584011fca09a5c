use domain::{
    Address, Carrier, CarrierProfile, ContactPerson, Context, DfSetup, DomainError, GlsSetup,
    Seller, Shipment,
};
use infrastructure::memory::InMemoryIms;
use infrastructure::{resolve_sender, resolve_setup, ImsApi};
use serde_json::json;
use shared::AppError;

fn shipment(seller_id: Option<i64>) -> Shipment {
    serde_json::from_value(json!({
        "id": 1,
        "shipmentNumber": "S-1",
        "sellerId": seller_id,
        "deliveryAddress": {"countryCode": "DK"}
    }))
    .unwrap()
}

fn seller_with_document(document: &str) -> Seller {
    Seller {
        id: 5,
        address: Address {
            addressee: Some("Seller ApS".to_string()),
            ..Address::default()
        },
        contact_person: Some(ContactPerson {
            name: Some("Mette".to_string()),
            ..ContactPerson::default()
        }),
        data_document: Some(document.to_string()),
    }
}

/// セラー付きの出荷はセラーのセットアップを使う
#[tokio::test]
async fn test_setup_resolved_from_seller() {
    let ims = InMemoryIms::new()
        .with_seller(seller_with_document(
            r#"{"GLSTransport":{"userName":"seller","password":"p","customerId":"c","contactId":"k"}}"#,
        ))
        .with_carrier(Carrier {
            id: Some(1),
            carrier_name: "GLS".to_string(),
            data_document: Some(
                r#"{"GLSTransport":{"userName":"default","password":"p","customerId":"c","contactId":"k"}}"#
                    .to_string(),
            ),
        });

    let resolved = resolve_setup::<GlsSetup, _>(&ims, &shipment(Some(5)), CarrierProfile::Gls)
        .await
        .unwrap();

    assert_eq!(resolved.setup.user_name, "seller");
    assert_eq!(resolved.seller.unwrap().id, 5);
}

/// セラーなしの出荷は運送会社レコードのセットアップにフォールバック
#[tokio::test]
async fn test_setup_falls_back_to_carrier_record() {
    let ims = InMemoryIms::new().with_carrier(Carrier {
        id: Some(2),
        carrier_name: "DF".to_string(),
        data_document: Some(
            CarrierProfile::Df.wrap_setup(&json!({"clientId": "id", "clientSecret": "s", "host": "df.test"})),
        ),
    });

    let resolved = resolve_setup::<DfSetup, _>(&ims, &shipment(None), CarrierProfile::Df)
        .await
        .unwrap();

    assert_eq!(resolved.setup.host, "df.test");
    assert!(resolved.seller.is_none());
}

#[tokio::test]
async fn test_missing_carrier_record() {
    let ims = InMemoryIms::new();

    let error = resolve_setup::<GlsSetup, _>(&ims, &shipment(None), CarrierProfile::Gls)
        .await
        .unwrap_err();

    assert!(matches!(error, AppError::Domain(DomainError::CarrierNotFound(_))));
}

#[tokio::test]
async fn test_seller_without_setup() {
    let ims = InMemoryIms::new().with_seller(seller_with_document(r#"{"SomethingElse":{}}"#));

    let error = resolve_setup::<GlsSetup, _>(&ims, &shipment(Some(5)), CarrierProfile::Gls)
        .await
        .unwrap_err();

    assert!(matches!(error, AppError::Domain(DomainError::MissingSetup(_))));
}

#[tokio::test]
async fn test_unknown_seller_is_not_found() {
    let ims = InMemoryIms::new();

    let error = resolve_setup::<GlsSetup, _>(&ims, &shipment(Some(99)), CarrierProfile::Gls)
        .await
        .unwrap_err();

    assert!(matches!(error, AppError::NotFound(path) if path == "sellers/99"));
}

#[tokio::test]
async fn test_sender_from_seller_or_context() {
    let seller = seller_with_document("{}");
    let ims = InMemoryIms::new().with_context(Context {
        id: 3,
        address: Address {
            addressee: Some("Warehouse A/S".to_string()),
            ..Address::default()
        },
        contact_person: None,
    });

    let from_seller = resolve_sender(&ims, Some(&seller), 3).await.unwrap();
    assert_eq!(from_seller.address.addressee.as_deref(), Some("Seller ApS"));
    assert!(from_seller.contact_person.is_some());

    let from_context = resolve_sender(&ims, None, 3).await.unwrap();
    assert_eq!(from_context.address.addressee.as_deref(), Some("Warehouse A/S"));
}

#[tokio::test]
async fn test_typed_and_raw_shipment() {
    let ims = InMemoryIms::new().with_shipment(json!({
        "id": 8,
        "shipmentNumber": "S-8",
        "deliveryAddress": {"countryCode": "SE"},
        "customField": {"priority": "HIGH"}
    }));

    let (raw, typed) = ims.get_shipment(8).await.unwrap();

    assert_eq!(typed.shipment_number, "S-8");
    assert_eq!(raw["customField"]["priority"], "HIGH");
}
