use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use miette::{miette, Context, IntoDiagnostic, Result};
use tga_file::{TgaFile, TgaReader, TgaWriter, TgaWriterOptions};
use tracing::{error, info, instrument};
use walkdir::WalkDir;

/// Extensions used for TGA files, tried in this order when a name has none
const EXTENSIONS: [&str; 5] = ["tga", "vst", "icb", "vda", "win"];

fn is_tga(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Find the file meant by a name given without an extension
fn resolve(path: &Path) -> Option<PathBuf> {
    if path.exists() || path.extension().is_some() {
        return Some(path.to_path_buf());
    }

    EXTENSIONS
        .iter()
        .map(|ext| path.with_extension(ext))
        .find(|candidate| candidate.exists())
}

/// Expand the given paths into the TGA files they name or contain
fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            files.extend(
                WalkDir::new(path)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| !e.file_type().is_dir())
                    .map(|e| e.into_path())
                    .filter(|p| is_tga(p)),
            );
        } else {
            match resolve(path) {
                Some(file) => files.push(file),
                None => error!("unable to find {}", path.display()),
            }
        }
    }

    files
}

/// Rewrite a file in place through a temporary sibling
///
/// `configure` sees the decoded file and returns `None` to leave it untouched.
#[instrument(skip_all, fields(file = %path.display()))]
fn rewrite(path: &Path, configure: &dyn Fn(&TgaFile) -> Option<TgaWriterOptions>) -> Result<()> {
    let input = File::open(path)
        .into_diagnostic()
        .context(format!("opening {}", path.display()))?;
    let mut source = TgaReader::new(BufReader::new(input))?;

    let file = source.file().clone();
    let Some(options) = configure(&file) else {
        info!("nothing to do for {} image", file.header.image_type);
        return Ok(());
    };

    let temp = path.with_extension("$$$");
    let out = File::create(&temp)
        .into_diagnostic()
        .context(format!("creating {}", temp.display()))?;

    if let Err(e) = TgaWriter::new(BufWriter::new(out), options).write(&file, &mut source) {
        let _ = fs::remove_file(&temp);
        return Err(e).context(format!("writing {}", temp.display()));
    }
    drop(source);

    fs::rename(&temp, path)
        .into_diagnostic()
        .context(format!("replacing {}", path.display()))?;

    info!("rewrote {}", path.display());
    Ok(())
}

/// Rewrite every file, logging failures and carrying on with the next one
pub fn run(
    paths: &[PathBuf],
    configure: &dyn Fn(&TgaFile) -> Option<TgaWriterOptions>,
) -> Result<()> {
    let files = collect_files(paths);
    if files.is_empty() {
        return Err(miette!("no tga files found"));
    }

    let mut failed = 0;
    for file in &files {
        if let Err(e) = rewrite(file, configure) {
            error!("{}: {e:?}", file.display());
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(miette!(
            "{} of {} files could not be processed",
            failed,
            files.len()
        ));
    }

    Ok(())
}
