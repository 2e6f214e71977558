//! Write queries.
//!
//! A [`WriteQuery`] writes the cells of a [`Subarray`] of an [`Array`] opened in [`Mode::Write`].
//! It is configured in steps, each of which can fail with a [`QueryError`] naming the [`QueryStep`]:
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # use std::sync::Arc;
//! use rasterstore::array::{
//!     Array, ArraySchemaBuilder, Attribute, Context, DataType, Dimension, Domain, Layout, Mode,
//!     Subarray, WriteQuery,
//! };
//! # let store = Arc::new(rasterstore::storage::store::MemoryStore::new());
//! let context = Context::new(store);
//! let schema = ArraySchemaBuilder::new(Domain::new(vec![
//!     Dimension::new("y", DataType::Int32, [0, 1])?,
//!     Dimension::new("x", DataType::Int32, [0, 2])?,
//! ])?)
//! .attribute(Attribute::new("a", DataType::UInt8)?)
//! .build()?;
//! Array::create(&context, "/array", &schema)?;
//!
//! let array = Array::open(&context, "/array", Mode::Write)?;
//! WriteQuery::new(&array)?
//!     .layout(Layout::RowMajor)?
//!     .subarray(&Subarray::new().add_range("x", [1, 2]))?
//!     .data_buffer("a", &[1, 2, 3, 4])?
//!     .submit()?;
//! array.close();
//! # Ok(())
//! # }
//! ```

use std::borrow::Cow;

use derive_more::Display;
use thiserror::Error;

use crate::{array_subset::ArraySubset, storage::ReadableWritableStorageTraits};

use super::{Array, ArrayError, Attribute, Mode, Subarray};

/// The layout of the cells in a query buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Display)]
pub enum Layout {
    /// The last dimension varies fastest.
    #[default]
    #[display("row-major")]
    RowMajor,
    /// The first dimension varies fastest.
    #[display("col-major")]
    ColumnMajor,
    /// Cells in no particular order, with explicit coordinates. Only valid for sparse arrays.
    #[display("unordered")]
    Unordered,
}

/// A step of a [`WriteQuery`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum QueryStep {
    /// [`WriteQuery::new`].
    #[display("create")]
    Create,
    /// [`WriteQuery::layout`].
    #[display("set layout")]
    SetLayout,
    /// [`WriteQuery::subarray`].
    #[display("set subarray")]
    SetSubarray,
    /// [`WriteQuery::data_buffer`].
    #[display("set data buffer")]
    SetDataBuffer,
    /// [`WriteQuery::submit`].
    #[display("submit")]
    Submit,
}

/// A write query error.
#[derive(Debug, Error)]
#[error("write query step {step} failed: {source}")]
pub struct QueryError {
    step: QueryStep,
    source: ArrayError,
}

impl QueryError {
    /// Create a new query error at `step`.
    #[must_use]
    pub fn new(step: QueryStep, source: ArrayError) -> Self {
        Self { step, source }
    }

    /// Return the step that failed.
    #[must_use]
    pub const fn step(&self) -> QueryStep {
        self.step
    }

    /// Return the underlying array error.
    #[must_use]
    pub const fn kind(&self) -> &ArrayError {
        &self.source
    }
}

/// A dense write query.
///
/// The query borrows the [`Array`] and the data buffers until it is submitted.
#[derive(Debug)]
#[must_use]
pub struct WriteQuery<'q, 'a, TStorage: ?Sized> {
    array: &'q Array<'a, TStorage>,
    layout: Layout,
    subarray: Option<ArraySubset>,
    data_buffers: Vec<(String, &'q [u8])>,
}

impl<'q, 'a, TStorage: ?Sized> WriteQuery<'q, 'a, TStorage> {
    /// Create a new write query on `array`.
    ///
    /// The layout defaults to [`Layout::RowMajor`] and the subarray to the full domain.
    ///
    /// # Errors
    /// Returns a [`QueryError`] at [`QueryStep::Create`] if the array is not open in [`Mode::Write`].
    pub fn new(array: &'q Array<'a, TStorage>) -> Result<Self, QueryError> {
        if array.mode() != Mode::Write {
            return Err(QueryError::new(
                QueryStep::Create,
                ArrayError::InvalidMode {
                    expected: Mode::Write,
                    actual: array.mode(),
                },
            ));
        }
        Ok(Self {
            array,
            layout: Layout::default(),
            subarray: None,
            data_buffers: Vec::new(),
        })
    }

    /// Set the layout of the data buffers.
    ///
    /// # Errors
    /// Returns a [`QueryError`] at [`QueryStep::SetLayout`] if the layout is [`Layout::Unordered`].
    pub fn layout(mut self, layout: Layout) -> Result<Self, QueryError> {
        if layout == Layout::Unordered {
            return Err(QueryError::new(
                QueryStep::SetLayout,
                ArrayError::UnsupportedLayout(layout),
            ));
        }
        self.layout = layout;
        Ok(self)
    }

    /// Set the subarray to write.
    ///
    /// # Errors
    /// Returns a [`QueryError`] at [`QueryStep::SetSubarray`] if the subarray is not valid for the array domain.
    pub fn subarray(mut self, subarray: &Subarray) -> Result<Self, QueryError> {
        let subset = subarray
            .to_array_subset(self.array.schema().domain())
            .map_err(|err| QueryError::new(QueryStep::SetSubarray, err))?;
        self.subarray = Some(subset);
        Ok(self)
    }

    /// Set the data buffer of `attribute`.
    ///
    /// # Errors
    /// Returns a [`QueryError`] at [`QueryStep::SetDataBuffer`] if the attribute is unknown or its buffer is already set.
    pub fn data_buffer(mut self, attribute: &str, bytes: &'q [u8]) -> Result<Self, QueryError> {
        let err = |err| QueryError::new(QueryStep::SetDataBuffer, err);
        if self.array.schema().attribute(attribute).is_none() {
            return Err(err(ArrayError::UnknownAttribute(attribute.to_string())));
        }
        if self.data_buffers.iter().any(|(name, _)| name == attribute) {
            return Err(err(ArrayError::DuplicateDataBuffer(attribute.to_string())));
        }
        self.data_buffers.push((attribute.to_string(), bytes));
        Ok(self)
    }
}

impl<TStorage: ?Sized + ReadableWritableStorageTraits> WriteQuery<'_, '_, TStorage> {
    /// Submit the query, blocking until all cells are stored.
    ///
    /// # Errors
    /// Returns a [`QueryError`] at [`QueryStep::Submit`] if
    ///  - an attribute has no data buffer,
    ///  - a data buffer length does not match the number of cells in the subarray, or
    ///  - there is an underlying storage error.
    pub fn submit(self) -> Result<(), QueryError> {
        self.submit_inner()
            .map_err(|err| QueryError::new(QueryStep::Submit, err))
    }

    fn submit_inner(&self) -> Result<(), ArrayError> {
        let schema = self.array.schema();
        let subset = self
            .subarray
            .clone()
            .unwrap_or_else(|| schema.domain().subset_all());
        let num_elements = subset.num_elements().ok_or(ArrayError::TooManyElements)?;

        let mut buffers: Vec<(&Attribute, Cow<[u8]>)> =
            Vec::with_capacity(schema.attributes().len());
        for attribute in schema.attributes() {
            let bytes = self
                .data_buffers
                .iter()
                .find(|(name, _)| name == attribute.name())
                .map(|(_, bytes)| *bytes)
                .ok_or_else(|| ArrayError::MissingDataBuffer(attribute.name().to_string()))?;
            let element_size = attribute.data_type().size();
            let expected_size = num_elements
                .checked_mul(element_size as u64)
                .ok_or(ArrayError::TooManyElements)?;
            if bytes.len() as u64 != expected_size {
                return Err(ArrayError::InvalidBytesInputSize(
                    attribute.name().to_string(),
                    bytes.len(),
                    expected_size,
                ));
            }
            let bytes = match self.layout {
                Layout::RowMajor => Cow::Borrowed(bytes),
                Layout::ColumnMajor => {
                    Cow::Owned(column_major_to_row_major(bytes, subset.shape(), element_size))
                }
                Layout::Unordered => return Err(ArrayError::UnsupportedLayout(self.layout)),
            };
            buffers.push((attribute, bytes));
        }

        self.array.store_subset(&subset, &buffers)
    }
}

/// Reorder `bytes` of `shape` from column-major to row-major.
///
/// `bytes` must hold exactly the elements of `shape`.
#[allow(clippy::cast_possible_truncation)]
fn column_major_to_row_major(bytes: &[u8], shape: &[u64], element_size: usize) -> Vec<u8> {
    let shape: Vec<usize> = shape.iter().map(|&extent| extent as usize).collect();
    let mut strides = vec![element_size; shape.len()];
    for dim in 1..shape.len() {
        strides[dim] = strides[dim - 1] * shape[dim - 1];
    }

    let mut output = Vec::with_capacity(bytes.len());
    let mut indices = vec![0usize; shape.len()];
    for _ in 0..bytes.len() / element_size {
        let offset: usize = std::iter::zip(&indices, &strides)
            .map(|(index, stride)| index * stride)
            .sum();
        output.extend_from_slice(&bytes[offset..offset + element_size]);
        for dim in (0..shape.len()).rev() {
            indices[dim] += 1;
            if indices[dim] < shape[dim] {
                break;
            }
            indices[dim] = 0;
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_major() {
        // 2x3, column-major: (0,0) (1,0) (0,1) (1,1) (0,2) (1,2)
        let bytes = [0, 3, 1, 4, 2, 5];
        assert_eq!(
            column_major_to_row_major(&bytes, &[2, 3], 1),
            vec![0, 1, 2, 3, 4, 5]
        );
        let bytes = [0, 0, 3, 3, 1, 1, 4, 4, 2, 2, 5, 5];
        assert_eq!(
            column_major_to_row_major(&bytes, &[2, 3], 2),
            vec![0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5]
        );
        assert_eq!(column_major_to_row_major(&[1, 2, 3], &[3], 1), vec![1, 2, 3]);
    }

    #[test]
    fn query_step_display() {
        assert_eq!(QueryStep::Submit.to_string(), "submit");
        assert_eq!(QueryStep::SetDataBuffer.to_string(), "set data buffer");
        assert_eq!(Layout::ColumnMajor.to_string(), "col-major");
        let err = QueryError::new(
            QueryStep::SetLayout,
            ArrayError::UnsupportedLayout(Layout::Unordered),
        );
        assert_eq!(err.step(), QueryStep::SetLayout);
        assert_eq!(
            err.to_string(),
            "write query step set layout failed: layout unordered is not supported by dense arrays"
        );
    }
}
