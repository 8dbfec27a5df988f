pub mod detection;
pub mod fix;
pub mod table;
pub mod time;
pub mod track;

pub use detection::{DeltaRecord, FlagReasons, FlagResult};
pub use fix::{Fix, FixRow};
pub use table::{normalize_column_name, RecordTable};
pub use time::TimestampFormat;
pub use track::VesselTrack;
