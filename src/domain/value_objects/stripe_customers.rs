/// Outcome of inserting a customer mapping. `Conflict` means the storage
/// layer's uniqueness constraint fired: another request mapped this user
/// between our lookup and our insert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CustomerMappingInsert {
    Inserted,
    Conflict,
}
