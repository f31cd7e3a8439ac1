//! Lattice storage: the vp samples either held in memory or read from disk.
//!
//! The lattice file is a flat array of little-endian `f32` values ordered
//! with z outermost and x innermost (see [`Dimensions::offset`]).

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::LoadOptions;
use crate::error::{ModelError, Result};
use crate::types::{Dimensions, PropertyTuple};

/// Size of one stored sample in bytes.
pub const SAMPLE_SIZE: u64 = std::mem::size_of::<f32>() as u64;

/// Where the lattice is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residency {
    InMemory,
    FileBacked,
}

impl std::fmt::Display for Residency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Residency::InMemory => write!(f, "in-memory"),
            Residency::FileBacked => write!(f, "file-backed"),
        }
    }
}

/// The vp lattice of a loaded model.
#[derive(Debug)]
pub enum GridStore {
    /// Every sample decoded into memory.
    InMemory { dims: Dimensions, data: Vec<f32> },
    /// Samples read from the file on demand with positioned reads.
    FileBacked {
        dims: Dimensions,
        path: PathBuf,
        file: File,
    },
}

impl GridStore {
    /// Open the lattice at `path`, loading it into memory when possible.
    ///
    /// Falls back to file-backed access when the lattice exceeds the memory
    /// cap, the allocation fails, or the bulk read fails. Fails outright only
    /// when the file is missing or shorter than `dims` requires.
    pub fn open(path: impl AsRef<Path>, dims: Dimensions, options: &LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        let metadata =
            std::fs::metadata(path).map_err(|_| ModelError::GridNotFound(path.to_path_buf()))?;

        let expected = dims.len() as u64 * SAMPLE_SIZE;
        if metadata.len() < expected {
            return Err(ModelError::GridTooShort {
                path: path.to_path_buf(),
                expected,
                actual: metadata.len(),
            });
        }

        if options.force_file_backed {
            debug!(path = %path.display(), "File-backed access requested");
            return Self::file_backed(path, dims);
        }

        if let Some(cap) = options.max_memory_bytes() {
            if expected > cap {
                warn!(
                    path = %path.display(),
                    size_bytes = expected,
                    cap_bytes = cap,
                    "Model exceeds memory cap; reading from disk may be slow"
                );
                return Self::file_backed(path, dims);
            }
        }

        match read_lattice(path, dims) {
            Ok(data) => {
                info!(path = %path.display(), samples = data.len(), "Loaded model into memory");
                Ok(GridStore::InMemory { dims, data })
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Could not load model into memory; reading from disk may be slow"
                );
                Self::file_backed(path, dims)
            }
        }
    }

    /// Wrap an already decoded lattice.
    pub fn from_vec(dims: Dimensions, data: Vec<f32>) -> Result<Self> {
        if data.len() != dims.len() {
            return Err(ModelError::storage(format!(
                "lattice has {} samples, dimensions require {}",
                data.len(),
                dims.len()
            )));
        }
        Ok(GridStore::InMemory { dims, data })
    }

    fn file_backed(path: &Path, dims: Dimensions) -> Result<Self> {
        let file = File::open(path).map_err(|_| ModelError::GridNotFound(path.to_path_buf()))?;
        Ok(GridStore::FileBacked {
            dims,
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn dims(&self) -> Dimensions {
        match self {
            GridStore::InMemory { dims, .. } | GridStore::FileBacked { dims, .. } => *dims,
        }
    }

    pub fn residency(&self) -> Residency {
        match self {
            GridStore::InMemory { .. } => Residency::InMemory,
            GridStore::FileBacked { .. } => Residency::FileBacked,
        }
    }

    /// Read the sample at lattice point `(x, y, z)`.
    ///
    /// Only vp is set; the other fields carry the no-data marker.
    ///
    /// # Preconditions
    /// `(x, y, z)` must address a lattice point. Bounds are enforced by the
    /// query path before any read; this accessor does not re-check them.
    pub fn read_lattice_point(&self, x: usize, y: usize, z: usize) -> Result<PropertyTuple> {
        let dims = self.dims();
        debug_assert!(
            dims.contains(x, y, z),
            "lattice index ({x}, {y}, {z}) outside {dims:?}"
        );
        let offset = dims.offset(x, y, z);

        let vp = match self {
            GridStore::InMemory { data, .. } => data[offset],
            GridStore::FileBacked { file, path, .. } => {
                let mut buf = [0u8; SAMPLE_SIZE as usize];
                read_exact_at(file, &mut buf, offset as u64 * SAMPLE_SIZE).map_err(|e| {
                    ModelError::storage(format!(
                        "failed to read sample {} of {}: {}",
                        offset,
                        path.display(),
                        e
                    ))
                })?;
                f32::from_le_bytes(buf)
            }
        };

        Ok(PropertyTuple::from_vp(vp as f64))
    }
}

/// Decode the whole lattice into memory.
fn read_lattice(path: &Path, dims: Dimensions) -> std::io::Result<Vec<f32>> {
    let mut data: Vec<f32> = Vec::new();
    data.try_reserve_exact(dims.len())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::OutOfMemory, e.to_string()))?;
    data.resize(dims.len(), 0.0);

    let mut file = File::open(path)?;
    file.read_exact(bytemuck::cast_slice_mut::<f32, u8>(data.as_mut_slice()))?;

    // Stored little-endian regardless of host
    if cfg!(target_endian = "big") {
        for v in &mut data {
            *v = f32::from_bits(u32::from_le(v.to_bits()));
        }
    }

    Ok(data)
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "failed to fill whole buffer",
                ))
            }
            Ok(n) => {
                buf = &mut std::mem::take(&mut buf)[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Write a lattice in the on-disk layout.
pub fn write_lattice(path: impl AsRef<Path>, data: &[f32]) -> std::io::Result<()> {
    let mut bytes = Vec::with_capacity(data.len() * SAMPLE_SIZE as usize);
    for v in data {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    std::fs::write(path, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lattice(dims: Dimensions) -> Vec<f32> {
        (0..dims.len()).map(|i| 1000.0 + i as f32).collect()
    }

    #[test]
    fn test_in_memory_and_file_backed_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vp.dat");
        let dims = Dimensions::new(3, 4, 2);
        write_lattice(&path, &lattice(dims)).unwrap();

        let memory = GridStore::open(&path, dims, &LoadOptions::default()).unwrap();
        assert_eq!(memory.residency(), Residency::InMemory);

        let options = LoadOptions {
            force_file_backed: true,
            ..Default::default()
        };
        let disk = GridStore::open(&path, dims, &options).unwrap();
        assert_eq!(disk.residency(), Residency::FileBacked);

        for z in 0..dims.nz {
            for y in 0..dims.ny {
                for x in 0..dims.nx {
                    let expected = 1000.0 + dims.offset(x, y, z) as f64;
                    let a = memory.read_lattice_point(x, y, z).unwrap();
                    let b = disk.read_lattice_point(x, y, z).unwrap();
                    assert_eq!(a.vp, expected);
                    assert_eq!(a, b);
                    assert_eq!(a.vs, -1.0);
                    assert_eq!(a.rho, -1.0);
                }
            }
        }
    }

    #[test]
    fn test_memory_cap_forces_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vp.dat");
        // 2 MiB + 4 bytes of samples against a 2 MiB cap
        let dims = Dimensions::new(512 * 1024 + 1, 1, 1);
        write_lattice(&path, &lattice(dims)).unwrap();

        let options = LoadOptions {
            max_memory_mb: Some(2),
            ..Default::default()
        };
        let store = GridStore::open(&path, dims, &options).unwrap();
        assert_eq!(store.residency(), Residency::FileBacked);
        let last = store.read_lattice_point(512 * 1024, 0, 0).unwrap();
        assert_eq!(last.vp, 1000.0 + (512 * 1024) as f64);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = GridStore::open(
            dir.path().join("vp.dat"),
            Dimensions::new(2, 2, 2),
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::GridNotFound(_)));
    }

    #[test]
    fn test_short_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vp.dat");
        write_lattice(&path, &[1.0, 2.0, 3.0]).unwrap();

        let err = GridStore::open(&path, Dimensions::new(2, 2, 1), &LoadOptions::default())
            .unwrap_err();
        match err {
            ModelError::GridTooShort {
                expected, actual, ..
            } => {
                assert_eq!(expected, 16);
                assert_eq!(actual, 12);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(GridStore::from_vec(Dimensions::new(2, 2, 2), vec![0.0; 8]).is_ok());
        assert!(GridStore::from_vec(Dimensions::new(2, 2, 2), vec![0.0; 7]).is_err());
    }
}
