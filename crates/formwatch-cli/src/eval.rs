//! One-shot evaluation of a keypoint file from the command line.

use std::io::Read;
use std::path::Path;

use formwatch_kernel::{Dispatcher, PostureIssue};
use formwatch_types::{FormError, Keypoint};

/// Read a JSON keypoint array from `input`, or from stdin when it is `-`.
pub fn read_keypoints(input: &Path) -> Result<Vec<Keypoint>, FormError> {
    let raw = if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| FormError::Transport(format!("failed to read stdin: {e}")))?;
        buf
    } else {
        std::fs::read_to_string(input).map_err(|e| {
            FormError::Transport(format!("failed to read {}: {e}", input.display()))
        })?
    };
    parse_keypoints(&raw)
}

pub(crate) fn parse_keypoints(raw: &str) -> Result<Vec<Keypoint>, FormError> {
    serde_json::from_str(raw)
        .map_err(|e| FormError::Protocol(format!("invalid keypoint array: {e}")))
}

/// Evaluate `input` for `activity` with the configured `dispatcher`.
pub fn run(
    dispatcher: &Dispatcher,
    activity: &str,
    input: &Path,
) -> Result<Vec<PostureIssue>, FormError> {
    let keypoints = read_keypoints(input)?;
    Ok(dispatcher.evaluate(&keypoints, activity))
}
