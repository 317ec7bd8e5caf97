use polars::prelude::*;

/// Target representation for a column named in [`DTYPE_POLICY`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactType {
    Categorical,
    UInt8,
    Float32,
}

impl CompactType {
    fn data_type(&self) -> DataType {
        match self {
            CompactType::Categorical => DataType::Categorical(None, CategoricalOrdering::Physical),
            CompactType::UInt8 => DataType::UInt8,
            CompactType::Float32 => DataType::Float32,
        }
    }

    fn is_satisfied_by(&self, dtype: &DataType) -> bool {
        match self {
            CompactType::Categorical => {
                matches!(dtype, DataType::Categorical(..) | DataType::Enum(..))
            }
            CompactType::UInt8 => dtype == &DataType::UInt8,
            CompactType::Float32 => dtype == &DataType::Float32,
        }
    }
}

/// Fixed column-name -> compact-type table. Columns not listed keep their
/// type; text columns are already polars' compact string view type.
/// Casts are strict: a value that does not fit fails the read.
pub const DTYPE_POLICY: &[(&str, CompactType)] = &[
    ("type", CompactType::Categorical),
    ("concept_name", CompactType::Categorical),
    ("publication_month", CompactType::UInt8),
    ("score", CompactType::Float32),
];

/// Cast expressions for the columns of `schema` that the policy covers and
/// that are not already in their target type.
pub fn compact_casts(schema: &Schema) -> Vec<Expr> {
    DTYPE_POLICY
        .iter()
        .filter_map(|(name, target)| {
            let dtype = schema.get(name)?;
            if target.is_satisfied_by(dtype) {
                None
            } else {
                Some(col(*name).strict_cast(target.data_type()))
            }
        })
        .collect()
}

/// Apply [`DTYPE_POLICY`] to a collected frame
pub fn compact_dtypes(df: DataFrame) -> PolarsResult<DataFrame> {
    let schema = df.schema().clone();
    let casts = compact_casts(&schema);
    if casts.is_empty() {
        return Ok(df);
    }
    df.lazy().with_columns(casts).collect()
}
