use serde::{Deserialize, Serialize};

use super::{Attribute, Domain, SchemaCreateError};

/// Check that `name` is a valid dimension or attribute name.
///
/// Names are non-empty, contain no `/`, and do not start with `__` (reserved for array internals).
pub(super) fn validate_name(name: &str) -> Result<(), SchemaCreateError> {
    if name.is_empty() || name.contains('/') || name.starts_with("__") {
        Err(SchemaCreateError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

/// The schema of a dense array.
///
/// Cells are laid out row-major over the [`Domain`] and each cell holds a value for every [`Attribute`].
/// The schema is stored as JSON in the `__schema.json` document of an array.
/// Create one with an [`ArraySchemaBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArraySchema {
    format_version: monostate::MustBe!(1u64),
    array_type: monostate::MustBe!("dense"),
    cell_order: monostate::MustBe!("row-major"),
    domain: Domain,
    attributes: Vec<Attribute>,
}

impl ArraySchema {
    /// Return the domain.
    #[must_use]
    pub const fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Return the attributes.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Return the attribute named `name`.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name() == name)
    }

    /// Check the schema, for example after it has been deserialised.
    ///
    /// # Errors
    /// Returns [`SchemaCreateError`] if the schema could not have been built with an [`ArraySchemaBuilder`].
    pub fn validate(&self) -> Result<(), SchemaCreateError> {
        self.domain.validate()?;
        for attribute in &self.attributes {
            attribute.validate()?;
        }
        ArraySchemaBuilder {
            domain: self.domain.clone(),
            attributes: self.attributes.clone(),
        }
        .build()?;
        Ok(())
    }
}

/// An [`ArraySchema`] builder.
///
/// The builder is initialised from a [`Domain`]; attributes are added with [`ArraySchemaBuilder::attribute`].
///
/// For example:
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use rasterstore::array::{ArraySchemaBuilder, Attribute, DataType, Dimension, Domain};
/// let domain = Domain::new(vec![
///     Dimension::new("y", DataType::Int32, [0, 99])?,
///     Dimension::new("x", DataType::Int32, [0, 199])?.with_tile_extent(100)?,
/// ])?;
/// let schema = ArraySchemaBuilder::new(domain)
///     .attribute(Attribute::new("pixel", DataType::UInt8)?)
///     .build()?;
/// assert_eq!(schema.domain().shape(), vec![100, 200]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ArraySchemaBuilder {
    domain: Domain,
    attributes: Vec<Attribute>,
}

impl ArraySchemaBuilder {
    /// Create a new array schema builder for `domain`, without attributes.
    #[must_use]
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            attributes: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn attribute(&mut self, attribute: Attribute) -> &mut Self {
        self.attributes.push(attribute);
        self
    }

    /// Build into an [`ArraySchema`].
    ///
    /// # Errors
    /// Returns [`SchemaCreateError`] if there are no attributes, or a name is shared by two attributes or by an attribute and a dimension.
    pub fn build(&self) -> Result<ArraySchema, SchemaCreateError> {
        if self.attributes.is_empty() {
            return Err(SchemaCreateError::NoAttributes);
        }
        let mut names: Vec<&str> = self
            .domain
            .dimensions()
            .iter()
            .map(super::Dimension::name)
            .collect();
        for attribute in &self.attributes {
            if names.contains(&attribute.name()) {
                return Err(SchemaCreateError::DuplicateName(
                    attribute.name().to_string(),
                ));
            }
            names.push(attribute.name());
        }
        Ok(ArraySchema {
            format_version: monostate::MustBe!(1u64),
            array_type: monostate::MustBe!("dense"),
            cell_order: monostate::MustBe!("row-major"),
            domain: self.domain.clone(),
            attributes: self.attributes.clone(),
        })
    }
}
