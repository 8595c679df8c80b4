pub(crate) mod annotations;
pub(crate) mod health;
pub(crate) mod instruments;
pub(crate) mod market;
