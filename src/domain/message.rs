use serde::{Deserialize, Serialize};

/// An inbound file-processing event handed to a workflow instance.
///
/// Pure data: construction never fails and nothing is validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    file_data_seq: Option<i64>,
    channel_ref: String,
    output_channel_code: String,
    file_s3_path: String,
}

impl IncomingMessage {
    pub fn new(
        file_data_seq: Option<i64>,
        channel_ref: impl Into<String>,
        output_channel_code: impl Into<String>,
        file_s3_path: impl Into<String>,
    ) -> Self {
        Self {
            file_data_seq,
            channel_ref: channel_ref.into(),
            output_channel_code: output_channel_code.into(),
            file_s3_path: file_s3_path.into(),
        }
    }

    pub fn file_data_seq(&self) -> Option<i64> {
        self.file_data_seq
    }

    pub fn channel_ref(&self) -> &str {
        &self.channel_ref
    }

    pub fn output_channel_code(&self) -> &str {
        &self.output_channel_code
    }

    pub fn file_s3_path(&self) -> &str {
        &self.file_s3_path
    }
}
