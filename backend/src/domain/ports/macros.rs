//! `define_port_error!`: declares a port error enum together with snake_case
//! constructors that accept anything convertible into each field type.
//!
//! ```ignore
//! define_port_error! {
//!     pub enum LedgerError {
//!         Connection { message: String } => "ledger unreachable: {message}",
//!     }
//! }
//! let err = LedgerError::connection("timeout");
//! ```

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };

    (@ctor $variant:ident) => {
        ::paste::paste! {
            #[doc = "Construct the `" $variant "` variant."]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* }) => {
        ::paste::paste! {
            #[doc = "Construct the `" $variant "` variant."]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum SeatPortError {
            Connection { message: String } => "seat store unreachable: {message}",
            SoldOut { class: String, remaining: u32 } => "{class} sold out ({remaining} left)",
            Closed => "seat store closed",
        }
    }

    #[test]
    fn string_fields_accept_str() {
        let err = SeatPortError::connection("timeout");
        assert_eq!(err.to_string(), "seat store unreachable: timeout");
    }

    #[test]
    fn mixed_fields_keep_their_types() {
        let err = SeatPortError::sold_out("Chess", 0_u32);
        assert_eq!(err.to_string(), "Chess sold out (0 left)");
    }

    #[test]
    fn unit_variants_get_constructors() {
        assert_eq!(SeatPortError::closed(), SeatPortError::Closed);
    }
}
