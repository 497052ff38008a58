//! Single-file NIfTI-1 volumes (`.nii`, `.nii.gz`).

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use flate2::Compression;
use flate2::write::GzEncoder;

use crate::io::{is_gz, open_maybe_gz};
use crate::volume::Grid3;

pub const HEADER_SIZE: usize = 348;
pub const VOX_OFFSET: usize = 352;
pub const MAGIC: [u8; 4] = *b"n+1\0";
const MAGIC_PAIR: [u8; 4] = *b"ni1\0";

const UNITS_MSEC: u8 = 0x10;
const UNITS_USEC: u8 = 0x18;
const UNITS_TIME_MASK: u8 = 0x38;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datatype {
    U8,
    I8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl Datatype {
    pub fn from_code(code: i16) -> Result<Self> {
        Ok(match code {
            2 => Self::U8,
            256 => Self::I8,
            4 => Self::I16,
            512 => Self::U16,
            8 => Self::I32,
            768 => Self::U32,
            16 => Self::F32,
            64 => Self::F64,
            other => bail!("unsupported NIfTI datatype code {}", other),
        })
    }

    pub fn code(self) -> i16 {
        match self {
            Self::U8 => 2,
            Self::I8 => 256,
            Self::I16 => 4,
            Self::U16 => 512,
            Self::I32 => 8,
            Self::U32 => 768,
            Self::F32 => 16,
            Self::F64 => 64,
        }
    }

    pub fn size(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/// Orientation and voxel-size fields carried over to derived volumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Spatial {
    pub pixdim: [f32; 8],
    pub xyzt_units: u8,
    pub qform_code: i16,
    pub sform_code: i16,
    pub quatern: [f32; 3],
    pub qoffset: [f32; 3],
    pub srow_x: [f32; 4],
    pub srow_y: [f32; 4],
    pub srow_z: [f32; 4],
}

impl Default for Spatial {
    fn default() -> Self {
        Self {
            pixdim: [1.0; 8],
            xyzt_units: 0,
            qform_code: 0,
            sform_code: 0,
            quatern: [0.0; 3],
            qoffset: [0.0; 3],
            srow_x: [1.0, 0.0, 0.0, 0.0],
            srow_y: [0.0, 1.0, 0.0, 0.0],
            srow_z: [0.0, 0.0, 1.0, 0.0],
        }
    }
}

#[derive(Debug, Clone)]
pub struct NiftiHeader {
    pub dims: Vec<usize>,
    pub datatype: Datatype,
    pub vox_offset: usize,
    pub scl_slope: f32,
    pub scl_inter: f32,
    pub big_endian: bool,
    pub spatial: Spatial,
}

impl NiftiHeader {
    pub fn grid(&self) -> Grid3 {
        let d = |i: usize| self.dims.get(i).copied().unwrap_or(1);
        Grid3::new(d(0), d(1), d(2))
    }

    /// Everything past the third dimension is flattened into frames.
    pub fn n_frames(&self) -> usize {
        self.dims.iter().skip(3).product()
    }

    /// Bounded by `usize`; `parse_header` rejects overflowing dimensions.
    pub fn n_values(&self) -> usize {
        self.dims.iter().product()
    }

    /// Repetition time in seconds from pixdim[4], if the header carries one.
    pub fn tr_seconds(&self) -> Option<f64> {
        if self.dims.len() < 4 {
            return None;
        }
        let raw = self.spatial.pixdim[4] as f64;
        if !(raw > 0.0) {
            return None;
        }
        match self.spatial.xyzt_units & UNITS_TIME_MASK {
            UNITS_MSEC => Some(raw / 1e3),
            UNITS_USEC => Some(raw / 1e6),
            _ => Some(raw),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NiftiImage {
    pub header: NiftiHeader,
    pub data: Vec<f32>,
}

pub fn read_nifti(path: &Path) -> Result<NiftiImage> {
    let mut reader =
        open_maybe_gz(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut raw = Vec::new();
    reader
        .read_to_end(&mut raw)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_nifti(&raw).with_context(|| format!("invalid NIfTI file {}", path.display()))
}

struct Fields<'a> {
    raw: &'a [u8],
    big_endian: bool,
}

impl Fields<'_> {
    fn bytes<const N: usize>(&self, off: usize) -> [u8; N] {
        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.raw[off..off + N]);
        if self.big_endian {
            buf.reverse();
        }
        buf
    }

    fn i16_at(&self, off: usize) -> i16 {
        i16::from_le_bytes(self.bytes(off))
    }

    fn i32_at(&self, off: usize) -> i32 {
        i32::from_le_bytes(self.bytes(off))
    }

    fn f32_at(&self, off: usize) -> f32 {
        f32::from_le_bytes(self.bytes(off))
    }

    fn f32_array<const N: usize>(&self, off: usize) -> [f32; N] {
        let mut out = [0.0f32; N];
        for (i, v) in out.iter_mut().enumerate() {
            *v = self.f32_at(off + i * 4);
        }
        out
    }
}

pub fn parse_header(raw: &[u8]) -> Result<NiftiHeader> {
    if raw.len() < HEADER_SIZE {
        bail!("file shorter than the {}-byte NIfTI-1 header", HEADER_SIZE);
    }
    let mut fields = Fields {
        raw,
        big_endian: false,
    };
    if fields.i32_at(0) != HEADER_SIZE as i32 {
        fields.big_endian = true;
        if fields.i32_at(0) != HEADER_SIZE as i32 {
            bail!("sizeof_hdr is not 348; not a NIfTI-1 file");
        }
    }

    let magic = &raw[344..348];
    if magic == MAGIC_PAIR {
        bail!("two-file NIfTI (.hdr/.img) is not supported");
    }
    if magic != MAGIC {
        bail!("NIfTI-1 magic mismatch");
    }

    let ndim = fields.i16_at(40);
    if !(1..=7).contains(&ndim) {
        bail!("dim[0] must be within 1..=7, found {}", ndim);
    }
    let mut dims = Vec::with_capacity(ndim as usize);
    for i in 1..=ndim as usize {
        let d = fields.i16_at(40 + i * 2);
        if d <= 0 {
            bail!("dim[{}] must be positive, found {}", i, d);
        }
        dims.push(d as usize);
    }
    if dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d)).is_none() {
        bail!("dimensions overflow: {:?}", dims);
    }

    let datatype = Datatype::from_code(fields.i16_at(70))?;
    let vox_offset = fields.f32_at(108);
    if !(vox_offset >= HEADER_SIZE as f32) {
        bail!("vox_offset {} lies inside the header", vox_offset);
    }

    let spatial = Spatial {
        pixdim: fields.f32_array(76),
        xyzt_units: raw[123],
        qform_code: fields.i16_at(252),
        sform_code: fields.i16_at(254),
        quatern: fields.f32_array(256),
        qoffset: fields.f32_array(268),
        srow_x: fields.f32_array(280),
        srow_y: fields.f32_array(296),
        srow_z: fields.f32_array(312),
    };

    Ok(NiftiHeader {
        dims,
        datatype,
        vox_offset: vox_offset as usize,
        scl_slope: fields.f32_at(112),
        scl_inter: fields.f32_at(116),
        big_endian: fields.big_endian,
        spatial,
    })
}

pub fn parse_nifti(raw: &[u8]) -> Result<NiftiImage> {
    let header = parse_header(raw)?;
    let n = header.n_values();
    let size = header.datatype.size();
    let end = match n
        .checked_mul(size)
        .and_then(|bytes| bytes.checked_add(header.vox_offset))
    {
        Some(end) => end,
        None => bail!("dimensions overflow: {} voxels of {} bytes", n, size),
    };
    if raw.len() < end {
        bail!(
            "payload truncated: need {} bytes for {} voxels, file has {}",
            end,
            n,
            raw.len()
        );
    }
    let payload = &raw[header.vox_offset..end];
    let mut data = decode_payload(payload, header.datatype, header.big_endian);

    let slope = header.scl_slope;
    let inter = header.scl_inter;
    if slope != 0.0 && slope.is_finite() && !(slope == 1.0 && inter == 0.0) {
        for v in data.iter_mut() {
            *v = *v * slope + inter;
        }
    }

    Ok(NiftiImage { header, data })
}

fn decode_payload(payload: &[u8], datatype: Datatype, big_endian: bool) -> Vec<f32> {
    let size = datatype.size();
    payload
        .chunks_exact(size)
        .map(|chunk| {
            let mut buf = [0u8; 8];
            buf[..size].copy_from_slice(chunk);
            if big_endian {
                buf[..size].reverse();
            }
            match datatype {
                Datatype::U8 => buf[0] as f32,
                Datatype::I8 => buf[0] as i8 as f32,
                Datatype::I16 => i16::from_le_bytes([buf[0], buf[1]]) as f32,
                Datatype::U16 => u16::from_le_bytes([buf[0], buf[1]]) as f32,
                Datatype::I32 => i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as f32,
                Datatype::U32 => u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as f32,
                Datatype::F32 => f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
                Datatype::F64 => f64::from_le_bytes(buf) as f32,
            }
        })
        .collect()
}

/// Writes a little-endian float32 NIfTI-1 file; gzipped when the path ends in `.gz`.
pub fn write_nifti(
    path: &Path,
    grid: Grid3,
    n_frames: usize,
    data: &[f32],
    spatial: &Spatial,
) -> Result<()> {
    let expected = grid.n_voxels() * n_frames;
    if data.len() != expected {
        bail!(
            "volume data length {} does not match {} grid x {} frames",
            data.len(),
            grid,
            n_frames
        );
    }
    let bytes = encode_nifti(grid, n_frames, data, spatial)?;
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    if is_gz(path) {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        encoder.write_all(&bytes)?;
        encoder.finish()?.flush()?;
    } else {
        let mut w = BufWriter::new(file);
        w.write_all(&bytes)?;
        w.flush()?;
    }
    Ok(())
}

pub fn encode_nifti(grid: Grid3, n_frames: usize, data: &[f32], spatial: &Spatial) -> Result<Vec<u8>> {
    let mut dims = vec![grid.nx, grid.ny, grid.nz];
    if n_frames > 1 {
        dims.push(n_frames);
    }
    let mut header = vec![0u8; VOX_OFFSET];
    put(&mut header, 0, &(HEADER_SIZE as i32).to_le_bytes());
    put(&mut header, 40, &(dims.len() as i16).to_le_bytes());
    for i in 0..7 {
        let d = dims.get(i).copied().unwrap_or(1);
        let d = i16::try_from(d).with_context(|| format!("dimension {} too large for NIfTI-1", d))?;
        put(&mut header, 42 + i * 2, &d.to_le_bytes());
    }
    put(&mut header, 70, &Datatype::F32.code().to_le_bytes());
    put(&mut header, 72, &32i16.to_le_bytes());

    let mut pixdim = spatial.pixdim;
    if pixdim[0] != -1.0 {
        pixdim[0] = 1.0;
    }
    for (i, p) in pixdim.iter().enumerate() {
        put(&mut header, 76 + i * 4, &p.to_le_bytes());
    }
    put(&mut header, 108, &(VOX_OFFSET as f32).to_le_bytes());
    put(&mut header, 112, &1.0f32.to_le_bytes());
    put(&mut header, 116, &0.0f32.to_le_bytes());
    header[123] = spatial.xyzt_units;
    put(&mut header, 252, &spatial.qform_code.to_le_bytes());
    put(&mut header, 254, &spatial.sform_code.to_le_bytes());
    put_f32s(&mut header, 256, &spatial.quatern);
    put_f32s(&mut header, 268, &spatial.qoffset);
    put_f32s(&mut header, 280, &spatial.srow_x);
    put_f32s(&mut header, 296, &spatial.srow_y);
    put_f32s(&mut header, 312, &spatial.srow_z);
    put(&mut header, 344, &MAGIC);

    let mut out = header;
    out.reserve(data.len() * 4);
    for v in data {
        out.extend_from_slice(&v.to_le_bytes());
    }
    Ok(out)
}

fn put(buf: &mut [u8], off: usize, bytes: &[u8]) {
    buf[off..off + bytes.len()].copy_from_slice(bytes);
}

fn put_f32s(buf: &mut [u8], off: usize, values: &[f32]) {
    for (i, v) in values.iter().enumerate() {
        put(buf, off + i * 4, &v.to_le_bytes());
    }
}
