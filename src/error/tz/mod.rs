pub(crate) mod provider;
pub(crate) mod table;
pub(crate) mod zone;
