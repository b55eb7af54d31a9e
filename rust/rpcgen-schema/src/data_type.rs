//! The closed set of types a schema can describe.

use std::fmt;

/// Built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scalar {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    String,
    Blob,
    Timestamp,
    Dynamic,
    Unit,
    Null,
}

impl Scalar {
    pub const ALL: [Scalar; 17] = [
        Scalar::Bool,
        Scalar::Int8,
        Scalar::Uint8,
        Scalar::Int16,
        Scalar::Uint16,
        Scalar::Int32,
        Scalar::Uint32,
        Scalar::Int64,
        Scalar::Uint64,
        Scalar::Float32,
        Scalar::Float64,
        Scalar::String,
        Scalar::Blob,
        Scalar::Timestamp,
        Scalar::Dynamic,
        Scalar::Unit,
        Scalar::Null,
    ];

    /// Keyword used in schema files (without the `t.` prefix).
    pub fn keyword(self) -> &'static str {
        match self {
            Scalar::Bool => "bool",
            Scalar::Int8 => "int8",
            Scalar::Uint8 => "uint8",
            Scalar::Int16 => "int16",
            Scalar::Uint16 => "uint16",
            Scalar::Int32 => "int32",
            Scalar::Uint32 => "uint32",
            Scalar::Int64 => "int64",
            Scalar::Uint64 => "uint64",
            Scalar::Float32 => "float32",
            Scalar::Float64 => "float64",
            Scalar::String => "string",
            Scalar::Blob => "blob",
            Scalar::Timestamp => "timestamp",
            Scalar::Dynamic => "dynamic",
            Scalar::Unit => "unit",
            Scalar::Null => "null",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Scalar> {
        Scalar::ALL.into_iter().find(|s| s.keyword() == keyword)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Scalar::Int8
                | Scalar::Uint8
                | Scalar::Int16
                | Scalar::Uint16
                | Scalar::Int32
                | Scalar::Uint32
                | Scalar::Int64
                | Scalar::Uint64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Scalar::Float32 | Scalar::Float64)
    }

    /// Width in bits and signedness, for integer scalars.
    pub fn integer_bits(self) -> Option<(u32, bool)> {
        match self {
            Scalar::Int8 => Some((8, true)),
            Scalar::Uint8 => Some((8, false)),
            Scalar::Int16 => Some((16, true)),
            Scalar::Uint16 => Some((16, false)),
            Scalar::Int32 => Some((32, true)),
            Scalar::Uint32 => Some((32, false)),
            Scalar::Int64 => Some((64, true)),
            Scalar::Uint64 => Some((64, false)),
            _ => None,
        }
    }

    /// May be used as a map key.
    pub fn is_comparable(self) -> bool {
        self == Scalar::String || self.is_integer()
    }

    /// May travel as a URL query parameter.
    pub fn is_query_paramable(self) -> bool {
        matches!(self, Scalar::Bool | Scalar::Timestamp | Scalar::String)
            || self.is_integer()
            || self.is_float()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One named, typed slot of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Property {
    pub name: String,
    pub ty: DataType,
    pub optional: bool,
}

/// A type as the code generators see it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Scalar(Scalar),
    /// Reference to a message by name. Resolved by lookup, never owned.
    Struct { name: String, use_cbor: bool },
    /// Anonymous inline record.
    StructLiteral(Vec<Property>),
    Union(Vec<DataType>),
    Map { key: Scalar, value: Box<DataType> },
    List(Box<DataType>),
    Tuple2 {
        item1: Box<DataType>,
        item2: Box<DataType>,
    },
    Tuple3 {
        item1: Box<DataType>,
        item2: Box<DataType>,
        item3: Box<DataType>,
    },
    Tuple4 {
        item1: Box<DataType>,
        item2: Box<DataType>,
        item3: Box<DataType>,
        item4: Box<DataType>,
    },
    Tuple5 {
        item1: Box<DataType>,
        item2: Box<DataType>,
        item3: Box<DataType>,
        item4: Box<DataType>,
        item5: Box<DataType>,
    },
}

impl DataType {
    pub const DYNAMIC: DataType = DataType::Scalar(Scalar::Dynamic);

    pub fn list(element: DataType) -> Self {
        DataType::List(Box::new(element))
    }

    pub fn map(key: Scalar, value: DataType) -> Self {
        DataType::Map {
            key,
            value: Box::new(value),
        }
    }

    /// Build the tuple variant matching `items.len()`; `None` outside 2..=5.
    pub fn tuple(items: Vec<DataType>) -> Option<Self> {
        let mut it = items.into_iter().map(Box::new);
        let ty = match it.len() {
            2 => DataType::Tuple2 {
                item1: it.next()?,
                item2: it.next()?,
            },
            3 => DataType::Tuple3 {
                item1: it.next()?,
                item2: it.next()?,
                item3: it.next()?,
            },
            4 => DataType::Tuple4 {
                item1: it.next()?,
                item2: it.next()?,
                item3: it.next()?,
                item4: it.next()?,
            },
            5 => DataType::Tuple5 {
                item1: it.next()?,
                item2: it.next()?,
                item3: it.next()?,
                item4: it.next()?,
                item5: it.next()?,
            },
            _ => return None,
        };
        Some(ty)
    }

    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            DataType::Scalar(s) => Some(*s),
            _ => None,
        }
    }

    pub fn is_tuple2(&self) -> bool {
        matches!(self, DataType::Tuple2 { .. })
    }

    pub fn is_tuple3(&self) -> bool {
        matches!(self, DataType::Tuple3 { .. })
    }

    pub fn is_tuple4(&self) -> bool {
        matches!(self, DataType::Tuple4 { .. })
    }

    pub fn is_tuple5(&self) -> bool {
        matches!(self, DataType::Tuple5 { .. })
    }

    /// Items of any tuple variant, in order.
    pub fn tuple_items(&self) -> Option<Vec<&DataType>> {
        match self {
            DataType::Tuple2 { item1, item2 } => Some(vec![item1.as_ref(), item2.as_ref()]),
            DataType::Tuple3 {
                item1,
                item2,
                item3,
            } => Some(vec![item1.as_ref(), item2.as_ref(), item3.as_ref()]),
            DataType::Tuple4 {
                item1,
                item2,
                item3,
                item4,
            } => Some(vec![
                item1.as_ref(),
                item2.as_ref(),
                item3.as_ref(),
                item4.as_ref(),
            ]),
            DataType::Tuple5 {
                item1,
                item2,
                item3,
                item4,
                item5,
            } => Some(vec![
                item1.as_ref(),
                item2.as_ref(),
                item3.as_ref(),
                item4.as_ref(),
                item5.as_ref(),
            ]),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        *self == DataType::Scalar(Scalar::Unit)
    }

    /// A scalar in the query-paramable set, or a list of one.
    pub fn is_query_paramable(&self) -> bool {
        match self {
            DataType::Scalar(s) => s.is_query_paramable(),
            DataType::List(inner) => inner.as_scalar().is_some_and(Scalar::is_query_paramable),
            _ => false,
        }
    }

    /// Calls `f` on this type and every type nested inside it, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a DataType)) {
        f(self);
        match self {
            DataType::Scalar(_) | DataType::Struct { .. } => {}
            DataType::StructLiteral(props) => {
                for p in props {
                    p.ty.walk(f);
                }
            }
            DataType::Union(variants) => {
                for v in variants {
                    v.walk(f);
                }
            }
            DataType::Map { value, .. } => value.walk(f),
            DataType::List(inner) => inner.walk(f),
            DataType::Tuple2 { .. }
            | DataType::Tuple3 { .. }
            | DataType::Tuple4 { .. }
            | DataType::Tuple5 { .. } => {
                for item in self.tuple_items().into_iter().flatten() {
                    item.walk(f);
                }
            }
        }
    }
}
