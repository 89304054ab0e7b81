//! Saved shipping addresses.

use serde::{Deserialize, Serialize};

use crate::ids::AddressId;

/// A geographic coordinate picked on the delivery map.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A shipping destination in the shopper's address book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedAddress {
    pub id: AddressId,
    /// Shopper-chosen label, e.g. "Home".
    pub label: String,
    pub phone: String,
    /// Top-level administrative region (division / state).
    pub region: String,
    pub district: String,
    /// Sub-district or neighbourhood.
    pub area: String,
    /// Street-level free text.
    pub full_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

impl SavedAddress {
    pub(crate) fn from_new(id: AddressId, new: NewAddress) -> Self {
        Self {
            id,
            label: new.label,
            phone: new.phone,
            region: new.region,
            district: new.district,
            area: new.area,
            full_address: new.full_address,
            location: new.location,
        }
    }

    /// Format as single line.
    pub fn one_line(&self) -> String {
        [
            self.full_address.as_str(),
            self.area.as_str(),
            self.district.as_str(),
            self.region.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
    }

    /// Check that the fields a courier needs are filled in.
    pub fn is_complete(&self) -> bool {
        !self.phone.is_empty() && !self.district.is_empty() && !self.full_address.is_empty()
    }

    pub(crate) fn apply(&mut self, patch: AddressPatch) {
        if let Some(label) = patch.label {
            self.label = label;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(region) = patch.region {
            self.region = region;
        }
        if let Some(district) = patch.district {
            self.district = district;
        }
        if let Some(area) = patch.area {
            self.area = area;
        }
        if let Some(full_address) = patch.full_address {
            self.full_address = full_address;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
    }
}

/// An address before it has been assigned an id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewAddress {
    pub label: String,
    pub phone: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub area: String,
    pub full_address: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

/// Partial address edit; present fields replace the stored ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressPatch {
    pub label: Option<String>,
    pub phone: Option<String>,
    pub region: Option<String>,
    pub district: Option<String>,
    pub area: Option<String>,
    pub full_address: Option<String>,
    /// `Some(None)` clears the pin.
    pub location: Option<Option<GeoPoint>>,
}

impl AddressPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<NewAddress> for AddressPatch {
    fn from(new: NewAddress) -> Self {
        Self {
            label: Some(new.label),
            phone: Some(new.phone),
            region: Some(new.region),
            district: Some(new.district),
            area: Some(new.area),
            full_address: Some(new.full_address),
            location: Some(new.location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> SavedAddress {
        SavedAddress::from_new(
            AddressId::new("addr_1"),
            NewAddress {
                label: "Home".to_string(),
                phone: "01712345678".to_string(),
                region: "Dhaka".to_string(),
                district: "Dhaka".to_string(),
                area: "Gulshan".to_string(),
                full_address: "Road 11, Block E, Banani".to_string(),
                location: Some(GeoPoint {
                    lat: 23.7925,
                    lng: 90.4078,
                }),
            },
        )
    }

    #[test]
    fn test_one_line() {
        assert_eq!(
            home().one_line(),
            "Road 11, Block E, Banani, Gulshan, Dhaka, Dhaka"
        );
        assert!(home().is_complete());
    }

    #[test]
    fn test_patch_replaces_present_fields_only() {
        let mut addr = home();
        addr.apply(AddressPatch {
            label: Some("Flat".to_string()),
            location: Some(None),
            ..AddressPatch::default()
        });

        assert_eq!(addr.label, "Flat");
        assert_eq!(addr.phone, "01712345678");
        assert_eq!(addr.location, None);
        assert_eq!(addr.id.as_str(), "addr_1");
    }
}
