//! Concat demuxer joins.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Render the concat demuxer list for `inputs`, one `file '<path>'` per line.
pub fn render_concat_list(inputs: &[PathBuf]) -> String {
    inputs
        .iter()
        .map(|path| {
            let escaped = path.to_string_lossy().replace('\'', "'\\''");
            format!("file '{}'\n", escaped)
        })
        .collect()
}

/// Write the list file with absolute paths.
///
/// The demuxer resolves relative entries against the list's directory,
/// so inputs are canonicalized first.
pub async fn write_concat_list(inputs: &[PathBuf], list_file: &Path) -> MediaResult<()> {
    let mut absolute = Vec::with_capacity(inputs.len());
    for input in inputs {
        let path = fs::canonicalize(input)
            .await
            .map_err(|_| MediaError::FileNotFound(input.clone()))?;
        absolute.push(path);
    }
    fs::write(list_file, render_concat_list(&absolute)).await?;
    Ok(())
}

/// Join `inputs` in order into `output` by stream copy.
pub async fn concat_videos(
    runner: &FfmpegRunner,
    inputs: &[PathBuf],
    list_file: &Path,
    output: &Path,
) -> MediaResult<()> {
    if inputs.is_empty() {
        return Err(MediaError::invalid_input("Nothing to concatenate"));
    }

    write_concat_list(inputs, list_file).await?;

    info!(
        inputs = inputs.len(),
        output = %output.display(),
        "Concatenating clips"
    );

    let cmd = FfmpegCommand::new(list_file, output)
        .input_args(["-f", "concat", "-safe", "0"])
        .codec_copy();
    runner.run(&cmd).await?;

    info!(output = %output.display(), "Concatenation complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_concat_list_escapes_quotes() {
        let list = render_concat_list(&[
            PathBuf::from("/w/clip-00-a.mp4"),
            PathBuf::from("/w/it's.mp4"),
        ]);
        assert_eq!(list, "file '/w/clip-00-a.mp4'\nfile '/w/it'\\''s.mp4'\n");
    }

    #[tokio::test]
    async fn test_write_concat_list_uses_absolute_paths_in_order() {
        let dir = TempDir::new().unwrap();
        let b = dir.path().join("clip-01-b.mp4");
        let a = dir.path().join("clip-00-a.mp4");
        fs::write(&a, b"a").await.unwrap();
        fs::write(&b, b"b").await.unwrap();

        let list_file = dir.path().join("concat.txt");
        write_concat_list(&[a.clone(), b.clone()], &list_file).await.unwrap();

        let contents = fs::read_to_string(&list_file).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("clip-00-a.mp4'"));
        assert!(lines[1].ends_with("clip-01-b.mp4'"));
        assert!(lines.iter().all(|l| l.starts_with("file '/")));
    }

    #[tokio::test]
    async fn test_missing_input_is_reported() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.mp4");
        let result = write_concat_list(&[missing], &dir.path().join("concat.txt")).await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
