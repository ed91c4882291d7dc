pub mod contributions;
pub mod domain;
pub mod error;
pub mod pagination;
pub mod ports;
pub mod texts;
pub mod users;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use contributions::{window_contributions, Window};
pub use domain::{Contribution, Identity, Text, User, UserCredentials, UserSummary};
pub use error::{ServiceError, ServiceResult};
pub use pagination::{Page, PageLimits, PageMeta, PageRequest};
pub use ports::{
    CorrectionService, DatabaseService, PortError, PortResult, TextScope, TranslationService,
};
pub use texts::{ContributionView, ListedText, TextDetail, TextListing, TextService, TextView};
pub use users::{Profile, UserDirectory};
