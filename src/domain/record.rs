use std::{fmt, hash::Hash};

use serde::Serialize;

use super::{FieldKind, FieldValue, StepId};

/// Identifier of one field inside a step record.
pub trait FieldId: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Wire name (camelCase, matches the serialized record key).
    fn name(self) -> &'static str;

    fn label(self) -> &'static str;

    fn kind(self) -> FieldKind;

    fn all() -> &'static [Self];

    fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|field| field.name() == name)
    }
}

/// A field whose value is a pure function of other fields in the same record.
pub struct ComputedField<R: FormRecord> {
    pub target: R::Field,
    pub sources: &'static [R::Field],
    pub derive: fn(&R) -> Option<FieldValue>,
}

impl<R: FormRecord> ComputedField<R> {
    pub fn depends_on(&self, changed: &[R::Field]) -> bool {
        self.sources.iter().any(|source| changed.contains(source))
    }
}

/// A per-step record with a fixed set of independently nullable fields.
///
/// Dependency edges and computed fields are declared statically so the
/// engine can clear descendants and re-derive values without knowing the
/// concrete record.
pub trait FormRecord: Clone + Default + fmt::Debug + Serialize + Send + Sync + 'static {
    type Field: FieldId;

    const STEP: StepId;

    fn get(&self, field: Self::Field) -> Option<FieldValue>;

    fn set(&mut self, field: Self::Field, value: Option<&FieldValue>);

    /// Direct children of `field`; cleared whenever `field` changes.
    fn dependents(_field: Self::Field) -> &'static [Self::Field] {
        &[]
    }

    /// Computed fields in evaluation order. A later entry may use an earlier
    /// entry's target as a source.
    fn computed() -> &'static [ComputedField<Self>] {
        &[]
    }

    /// Fields fed from outside the step (never typed by the user).
    fn inbound() -> &'static [Self::Field] {
        &[]
    }

    fn is_user_editable(field: Self::Field) -> bool {
        !Self::inbound().contains(&field)
            && !Self::computed()
                .iter()
                .any(|computed| computed.target == field)
    }
}

/// Declares the field enum of a record together with its typed accessors.
///
/// Each entry maps an enum variant to a struct member of type `Option<$ty>`,
/// its camelCase wire name, and a human label.
macro_rules! record_fields {
    (
        $(#[$meta:meta])*
        $vis:vis enum $field:ident for $record:ident {
            $( $variant:ident => $member:ident : $ty:ty, $name:literal, $label:literal; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $field {
            $( $variant, )*
        }

        impl $crate::domain::FieldId for $field {
            fn name(self) -> &'static str {
                match self {
                    $( $field::$variant => $name, )*
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $( $field::$variant => $label, )*
                }
            }

            fn kind(self) -> $crate::domain::FieldKind {
                match self {
                    $( $field::$variant => <$ty as $crate::domain::FieldSlot>::KIND, )*
                }
            }

            fn all() -> &'static [Self] {
                &[ $( $field::$variant, )* ]
            }
        }

        impl $record {
            fn read_field(&self, field: $field) -> Option<$crate::domain::FieldValue> {
                match field {
                    $(
                        $field::$variant => self
                            .$member
                            .as_ref()
                            .map(<$ty as $crate::domain::FieldSlot>::to_field_value),
                    )*
                }
            }

            fn write_field(&mut self, field: $field, value: Option<&$crate::domain::FieldValue>) {
                match field {
                    $(
                        $field::$variant => {
                            self.$member =
                                value.and_then(<$ty as $crate::domain::FieldSlot>::from_field_value);
                        }
                    )*
                }
            }
        }
    };
}

pub(crate) use record_fields;
