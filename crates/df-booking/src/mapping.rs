use domain::{Address, Attributes, ContactPerson, DomainError, Shipment};
use infrastructure::{DfConsignment, DfParcel, DfParty, Sender};
use serde::Deserialize;

const KNOWN_ATTRIBUTES: [&str; 3] = ["ShippingType", "ProductCode", "WhoPays"];

/// マッチした出荷指示の属性
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShippingAttributes {
    pub shipping_type: String,
    pub product_code: String,
    pub who_pays: String,
    #[serde(skip)]
    pub extra: Attributes,
}

impl ShippingAttributes {
    /// 既知の3項目を取り出し、残りは `extra` に残す
    pub fn from_attributes(attributes: &Attributes) -> Result<Self, DomainError> {
        let mut parsed: ShippingAttributes = serde_json::from_value(attributes.clone().into())
            .map_err(|e| DomainError::InvalidDataDocument(format!("shipping attributes: {e}")))?;
        parsed.extra = attributes
            .iter()
            .filter(|(key, _)| !KNOWN_ATTRIBUTES.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Ok(parsed)
    }
}

pub fn df_party(address: &Address, contact_person: Option<&ContactPerson>) -> DfParty {
    DfParty {
        name: address.addressee.clone(),
        street: address.street_name_and_number.clone(),
        zip_code: address.postal_code.clone(),
        city: address.city_town_or_village.clone(),
        country_code: address.country_code.clone(),
        contact: contact_person.and_then(|contact| contact.name.clone()),
        email: contact_person.and_then(|contact| contact.email.clone()),
        phone: contact_person.and_then(|contact| {
            contact
                .mobile_number
                .clone()
                .or_else(|| contact.phone_number.clone())
        }),
    }
}

pub fn df_consignment(shipment: &Shipment, sender: &Sender, attributes: ShippingAttributes) -> DfConsignment {
    let parcels = shipment
        .shipping_containers
        .iter()
        .enumerate()
        .map(|(index, container)| DfParcel {
            reference: format!("{} #{}", shipment.shipment_number, index + 1),
            weight: container.gross_weight,
        })
        .collect();

    DfConsignment {
        reference: shipment.shipment_number.clone(),
        shipping_type: attributes.shipping_type,
        product_code: attributes.product_code,
        who_pays: attributes.who_pays,
        sender: df_party(&sender.address, sender.contact_person.as_ref()),
        receiver: df_party(&shipment.delivery_address, shipment.contact_person.as_ref()),
        parcels,
        pick_up_point_id: shipment.pick_up_point_id.clone(),
        delivery_instructions: shipment.notes_on_delivery.clone(),
        extra: attributes.extra,
    }
}
