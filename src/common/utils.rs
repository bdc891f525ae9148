//! 文件系统辅助函数
use std::fs;
use std::io::Write;
use std::path::Path;

/// Permissions applied to every file the vault writes: owner read/write only.
pub const PRIVATE_FILE_MODE: u32 = 0o600;

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Writes `contents` to `path` through a uniquely named temporary file in the
/// same directory and a rename, so readers see either the old file or the new
/// one. Concurrent writers never share a temporary file.
///
/// 中文: 原子写入，防止在写入中断时数据损坏。临时文件名唯一，文件权限为 0o600。
pub fn atomic_write(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".pv-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(PRIVATE_FILE_MODE));
    }

    let mut file = builder.tempfile_in(parent_dir(path))?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(feature = "file-backend")]
/// Opens (creating if needed) the sibling lock file guarding `path`.
///
/// The data file itself is replaced on every write, so the advisory lock is
/// taken on `<path>.lock` instead.
pub fn open_lock_file(path: &Path) -> std::io::Result<fs::File> {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".lock");

    let mut options = fs::OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(PRIVATE_FILE_MODE);
    }
    options.open(path.with_file_name(name))
}
