use crate::errors::OdmResult;

/// Operations every kind of view supports.
pub trait ViewOperations {
    /// Returns the view name.
    fn name(&self) -> &str;

    /// Deletes the view from the database.
    fn drop(&self) -> OdmResult<()>;
}
