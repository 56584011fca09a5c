use chrono::NaiveDate;
use domain::country::iso_numeric;
use domain::{Address, ContactPerson, GlsSetup, Shipment};
use infrastructure::{GlsAddress, GlsAddresses, GlsParcel, GlsServices, GlsShipment, Sender};

/// GLS の追跡ページ URL
pub fn tracking_url(parcel_number: &str) -> String {
    format!("https://gls-group.eu/DK/da/find-pakke?txtAction=71000&match={parcel_number}")
}

pub fn gls_address(address: &Address, contact_person: Option<&ContactPerson>) -> GlsAddress {
    let mut gls_address = GlsAddress {
        name1: address.addressee.clone(),
        street1: address.street_name_and_number.clone(),
        zip_code: address.postal_code.clone(),
        city: address.city_town_or_village.clone(),
        country_num: address.country_code.as_deref().and_then(iso_numeric),
        ..GlsAddress::default()
    };

    if let Some(contact) = contact_person {
        gls_address.contact = contact.name.clone();
        gls_address.email = contact.email.clone();
        gls_address.mobile = contact.mobile_number.clone();
        gls_address.phone = contact.phone_number.clone();
    }

    gls_address
}

/// 配送条件と連絡先から GLS のサービス指定を組み立てる
pub fn gls_services(shipment: &Shipment) -> GlsServices {
    let terms = shipment.terms_of_delivery.as_deref().unwrap_or_default();
    let flag = |keyword: &str| terms.contains(keyword).then(|| "Y".to_string());

    GlsServices {
        shop_delivery: shipment.pick_up_point_id.clone(),
        set_notification_email: shipment
            .contact_person
            .as_ref()
            .and_then(|contact| contact.email.clone()),
        deposit: if terms.contains("Deposit") {
            shipment.notes_on_delivery.clone()
        } else {
            None
        },
        flex_delivery: flag("Flex"),
        direct_shop: flag("DirectShop"),
        private_delivery: flag("Private"),
    }
}

/// 出荷コンテナごとに1パーセル（参照は "<出荷番号> #<連番>"）
pub fn gls_parcels(shipment: &Shipment) -> Vec<GlsParcel> {
    shipment
        .shipping_containers
        .iter()
        .enumerate()
        .map(|(index, container)| GlsParcel {
            reference: format!("{} #{}", shipment.shipment_number, index + 1),
            weight: container.gross_weight,
        })
        .collect()
}

pub fn gls_shipment(setup: &GlsSetup, shipment: &Shipment, sender: &Sender, shipment_date: NaiveDate) -> GlsShipment {
    GlsShipment {
        user_name: setup.user_name.clone(),
        password: setup.password.clone(),
        customer_id: setup.customer_id.clone(),
        contact_id: setup.contact_id.clone(),
        shipment_date: shipment_date.format("%Y%m%d").to_string(),
        reference: shipment.shipment_number.clone(),
        parcels: gls_parcels(shipment),
        addresses: GlsAddresses {
            delivery: gls_address(&shipment.delivery_address, shipment.contact_person.as_ref()),
            alternative_shipper: gls_address(&sender.address, sender.contact_person.as_ref()),
        },
        services: gls_services(shipment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shipment(terms: Option<&str>) -> Shipment {
        serde_json::from_value(json!({
            "id": 1,
            "shipmentNumber": "S-100",
            "deliveryAddress": {
                "addressee": "Jens Hansen",
                "streetNameAndNumber": "Vestergade 1",
                "postalCode": "8000",
                "cityTownOrVillage": "Aarhus",
                "countryCode": "DK"
            },
            "contactPerson": {"name": "Jens", "email": "jens@example.dk", "mobileNumber": "+4512345678"},
            "shippingContainers": [{"id": 11, "grossWeight": 1.2}, {"id": 12}],
            "notesOnDelivery": "Behind the shed",
            "termsOfDelivery": terms
        }))
        .unwrap()
    }

    #[test]
    fn test_delivery_address_with_contact() {
        let shipment = shipment(None);
        let address = gls_address(&shipment.delivery_address, shipment.contact_person.as_ref());

        assert_eq!(address.name1.as_deref(), Some("Jens Hansen"));
        assert_eq!(address.street1.as_deref(), Some("Vestergade 1"));
        assert_eq!(address.zip_code.as_deref(), Some("8000"));
        assert_eq!(address.country_num, Some(208));
        assert_eq!(address.contact.as_deref(), Some("Jens"));
        assert_eq!(address.mobile.as_deref(), Some("+4512345678"));
        assert!(address.phone.is_none());
    }

    #[test]
    fn test_unknown_country_is_omitted() {
        let address = gls_address(
            &Address {
                country_code: Some("ZZ".to_string()),
                ..Address::default()
            },
            None,
        );
        assert!(address.country_num.is_none());
        assert!(address.contact.is_none());
    }

    #[test]
    fn test_services_from_terms_of_delivery() {
        let services = gls_services(&shipment(Some("Deposit,Flex")));

        assert_eq!(services.deposit.as_deref(), Some("Behind the shed"));
        assert_eq!(services.flex_delivery.as_deref(), Some("Y"));
        assert!(services.direct_shop.is_none());
        assert!(services.private_delivery.is_none());
        assert_eq!(services.set_notification_email.as_deref(), Some("jens@example.dk"));
    }

    #[test]
    fn test_no_terms_no_flags() {
        let services = gls_services(&shipment(None));
        assert!(services.deposit.is_none());
        assert!(services.flex_delivery.is_none());
        assert!(services.shop_delivery.is_none());
    }

    #[test]
    fn test_parcel_references_are_numbered() {
        let parcels = gls_parcels(&shipment(None));

        assert_eq!(parcels.len(), 2);
        assert_eq!(parcels[0].reference, "S-100 #1");
        assert_eq!(parcels[0].weight, Some(1.2));
        assert_eq!(parcels[1].reference, "S-100 #2");
        assert!(parcels[1].weight.is_none());
    }

    #[test]
    fn test_shipment_request() {
        let setup = GlsSetup {
            user_name: "user".to_string(),
            password: "secret".to_string(),
            customer_id: "2080060960".to_string(),
            contact_id: "208a144Uoo".to_string(),
        };
        let sender = Sender {
            address: Address {
                addressee: Some("Lager ApS".to_string()),
                country_code: Some("DK".to_string()),
                ..Address::default()
            },
            contact_person: None,
        };
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();

        let request = gls_shipment(&setup, &shipment(Some("Private")), &sender, date);

        assert_eq!(request.shipment_date, "20240307");
        assert_eq!(request.reference, "S-100");
        assert_eq!(request.contact_id, "208a144Uoo");
        assert_eq!(request.addresses.alternative_shipper.name1.as_deref(), Some("Lager ApS"));
        assert_eq!(request.services.private_delivery.as_deref(), Some("Y"));
    }

    #[test]
    fn test_tracking_url() {
        assert_eq!(
            tracking_url("05771234"),
            "https://gls-group.eu/DK/da/find-pakke?txtAction=71000&match=05771234"
        );
    }
}
