//! Pulling the executable out of a release archive.

use std::io::Read;

use flate2::read::GzDecoder;
use tar::Archive;

use crate::BINARY_NAMES;
use crate::error::{UpdateError, UpdateResult};

/// Extract the executable bytes from a downloaded archive.
///
/// Only `.tar.gz` archives are handled; Windows `.zip` archives must be
/// installed by hand from the release page.
pub(crate) fn extract_binary(asset_name: &str, archive: &[u8], html_url: &str) -> UpdateResult<Vec<u8>> {
    let name = asset_name.to_lowercase();
    if name.ends_with(".tar.gz") {
        extract_tar_gz(archive)
    } else if name.ends_with(".zip") {
        Err(UpdateError::ZipUnsupported {
            html_url: html_url.to_string(),
        })
    } else {
        Err(UpdateError::UnknownArchive {
            name: asset_name.to_string(),
        })
    }
}

/// Return the first regular file whose base name is a stompy executable.
pub(crate) fn extract_tar_gz<R: Read>(reader: R) -> UpdateResult<Vec<u8>> {
    let mut archive = Archive::new(GzDecoder::new(reader));

    for entry in archive.entries().map_err(UpdateError::ExtractionFailed)? {
        let mut entry = entry.map_err(UpdateError::ExtractionFailed)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let is_binary = entry
            .path()
            .map_err(UpdateError::ExtractionFailed)?
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| BINARY_NAMES.contains(&n));
        if !is_binary {
            continue;
        }

        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(UpdateError::ExtractionFailed)?;
        return Ok(data);
    }

    Err(UpdateError::BinaryNotFound)
}
