mod model;
mod specialty;

pub use model::{parse_age, ProfilePatch, RegistrationDraft, UserRecord, MAX_AGE, MIN_AGE};
pub(crate) use model::{timestamp_value, to_fields, NewUserDocument};
pub use specialty::{Specialty, UnknownSpecialty};
