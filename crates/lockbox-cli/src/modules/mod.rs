pub(crate) mod records;
pub(crate) mod system;
