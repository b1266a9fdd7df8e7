use crate::define_index_newtype;

// Jobs live in the problem definition owned by the search driver; activities
// only keep the index of the job they belong to.
define_index_newtype!(JobIdx);
