use serde::{Deserialize, Serialize};

use super::{array_schema::validate_name, DataType, FillValue, SchemaCreateError};

/// An attribute: a named value stored in every cell of an array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    #[serde(rename = "type")]
    data_type: DataType,
    fill_value: FillValue,
}

impl Attribute {
    /// Create a new attribute with the default fill value of `data_type`.
    ///
    /// # Errors
    /// Returns [`SchemaCreateError::InvalidName`] if the name is invalid.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Result<Self, SchemaCreateError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            data_type,
            fill_value: data_type.default_fill_value(),
        })
    }

    /// Set the fill value.
    ///
    /// # Errors
    /// Returns [`SchemaCreateError::IncompatibleFillValue`] if the fill value size does not match the data type.
    pub fn with_fill_value(
        mut self,
        fill_value: impl Into<FillValue>,
    ) -> Result<Self, SchemaCreateError> {
        let fill_value = fill_value.into();
        self.data_type.validate_fill_value(&fill_value)?;
        self.fill_value = fill_value;
        Ok(self)
    }

    /// Return the attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the data type.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Return the fill value.
    #[must_use]
    pub const fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// Check the attribute, for example after it has been deserialised.
    ///
    /// # Errors
    /// Returns [`SchemaCreateError`] if the name or fill value is invalid.
    pub fn validate(&self) -> Result<(), SchemaCreateError> {
        validate_name(&self.name)?;
        self.data_type.validate_fill_value(&self.fill_value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute() {
        let attribute = Attribute::new("pixel", DataType::UInt8).unwrap();
        assert_eq!(attribute.name(), "pixel");
        assert_eq!(attribute.data_type(), DataType::UInt8);
        assert_eq!(attribute.fill_value().as_bytes(), &[0]);

        let attribute = attribute.with_fill_value(255u8).unwrap();
        assert_eq!(attribute.fill_value().as_bytes(), &[255]);
        assert!(attribute.validate().is_ok());
        assert_eq!(
            serde_json::to_string(&attribute).unwrap(),
            r#"{"name":"pixel","type":"uint8","fill_value":[255]}"#
        );
    }

    #[test]
    fn attribute_invalid() {
        assert!(matches!(
            Attribute::new("a/b", DataType::UInt8),
            Err(SchemaCreateError::InvalidName(_))
        ));
        assert!(matches!(
            Attribute::new("pixel", DataType::UInt8)
                .unwrap()
                .with_fill_value(1i32),
            Err(SchemaCreateError::IncompatibleFillValue(_))
        ));
    }
}
