pub mod path_applier;
pub mod telephony;
pub mod transport;
