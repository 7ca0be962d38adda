pub mod design;
pub mod document;
pub mod extent;
pub mod migration;
pub mod properties;
pub mod publish;
pub mod session;
pub mod system;

pub use design::{DesignRecord, ExportSubmission, ProjectDetails};
pub use document::{
    ImageRef, OperationalLayer, PopupField, PopupInfo, StoryBlock, StoryCover, StoryDocument,
    TextStyle, WebMapDocument,
};
pub use extent::{ExtentAccumulator, ExtentBox, LayerExtent, SpatialReference};
pub use migration::{ImportFormat, MigrationBatch, MigrationItem};
pub use properties::{
    AreaType, DesignProperties, DiagramProperties, FeatureShape, SourceFeatureProperties,
    VolumeInformation,
};
pub use publish::{PublishResult, PublishStatus, RunOutcome, SessionStatus, StatusState};
pub use session::{SessionId, SessionKey};
pub use system::{ProjectData, ProjectTag, SystemDetail, SystemSummary};
