use crate::error::{CliError, CliResult};
use async_recursion::async_recursion;
use std::path::{Path, PathBuf};
use tokio::fs;

/// All `.cue` files below `root`, sorted. Hidden directories and `skip` are not entered.
pub async fn find_sheets(root: &Path, skip: &Path) -> CliResult<Vec<PathBuf>> {
    if !fs::metadata(root).await?.is_dir() {
        return Err(CliError::NotADirectory(root.to_path_buf()));
    }

    let skip = fs::canonicalize(skip)
        .await
        .unwrap_or_else(|_| skip.to_path_buf());
    let mut sheets = walk(root, &skip).await?;
    sheets.sort();
    Ok(sheets)
}

#[async_recursion]
async fn walk(dir: &Path, skip: &Path) -> CliResult<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut sheets = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();

        if entry.file_type().await?.is_dir() {
            if is_hidden(&path) || fs::canonicalize(&path).await? == skip {
                continue;
            }
            sheets.append(&mut walk(&path, skip).await?);
        } else if is_sheet(&path) {
            sheets.push(path);
        }
    }

    Ok(sheets)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn is_sheet(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("cue"))
}

/// `<output>/<sheet dir relative to root>/<sheet name without extension>`
pub fn album_output_dir(root: &Path, output: &Path, sheet: &Path) -> PathBuf {
    let relative_dir = sheet
        .parent()
        .and_then(|parent| parent.strip_prefix(root).ok())
        .unwrap_or(Path::new(""));
    let name = sheet
        .file_stem()
        .map(|stem| stem.to_os_string())
        .unwrap_or_else(|| "album".into());

    output.join(relative_dir).join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    #[tokio::test]
    async fn finds_sheets_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("b/Album B.cue"));
        touch(&root.join("a/Album A.CUE"));
        touch(&root.join("a/Album A.flac"));
        touch(&root.join("a/disc 2/Album A2.cue"));

        let sheets = find_sheets(root, &root.join("split")).await.unwrap();
        assert_eq!(
            sheets,
            vec![
                root.join("a/Album A.CUE"),
                root.join("a/disc 2/Album A2.cue"),
                root.join("b/Album B.cue"),
            ]
        );
    }

    #[tokio::test]
    async fn skips_hidden_and_output_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("album.cue"));
        touch(&root.join(".cache/old.cue"));
        touch(&root.join("split/album/album.cue"));

        let sheets = find_sheets(root, &root.join("split")).await.unwrap();
        assert_eq!(sheets, vec![root.join("album.cue")]);
    }

    #[tokio::test]
    async fn root_must_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("album.cue");
        touch(&file);

        assert!(matches!(
            find_sheets(&file, Path::new("split")).await,
            Err(CliError::NotADirectory(_))
        ));
    }

    #[test]
    fn output_dir_mirrors_the_library_layout() {
        assert_eq!(
            album_output_dir(
                Path::new("music"),
                Path::new("split"),
                Path::new("music/Band/1999 - Album.cue")
            ),
            PathBuf::from("split/Band/1999 - Album")
        );
        assert_eq!(
            album_output_dir(Path::new("."), Path::new("out"), Path::new("./Album.cue")),
            PathBuf::from("out/Album")
        );
    }
}
