pub(crate) mod fp;
