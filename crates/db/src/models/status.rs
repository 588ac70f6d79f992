//! Status helper enums mapping to SMALLINT columns.
//!
//! Discriminants match the values persisted in `status_id`; batch statuses
//! are ordered so that "monotonically non-decreasing" is a plain numeric
//! comparison.

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Batch lifecycle status.
    BatchStatus {
        Created = 0,
        Processing = 1,
        Completed = 2,
    }
}

define_status_enum! {
    /// Rendered-image lifecycle status.
    ImageStatus {
        /// Row inserted immediately before rendering starts; claims the
        /// cache slot but never satisfies a cache hit.
        Pending = 1,
        /// Render uploaded; `url` is set.
        Completed = 2,
    }
}
