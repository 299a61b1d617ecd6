use crate::foundation::core::fourcc;

/// Placeholder format for solid-color dim layers; no buffer is fetched.
pub const FOURCC_DIM: u32 = fourcc(b"DIML");

/// Coarse class used by the layering rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatClass {
    /// Any RGB layout.
    Rgb,
    /// Any YUV layout, packed or planar.
    Yuv,
    /// Dim placeholder.
    Dim,
}

/// Pixel formats the resolver knows about, keyed by DRM fourcc.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// `AR24`
    Argb8888,
    /// `AB24`
    Abgr8888,
    /// `RA24`
    Rgba8888,
    /// `BA24`
    Bgra8888,
    /// `XR24`
    Xrgb8888,
    /// `XB24`
    Xbgr8888,
    /// `RX24`
    Rgbx8888,
    /// `BX24`
    Bgrx8888,
    /// `RG24`
    Rgb888,
    /// `BG24`
    Bgr888,
    /// `RG16`
    Rgb565,
    /// `BG16`
    Bgr565,
    /// `YUYV`
    Yuyv,
    /// `UYVY`
    Uyvy,
    /// `YVYU`
    Yvyu,
    /// `VYUY`
    Vyuy,
    /// `NV12`
    Nv12,
    /// `NV21`
    Nv21,
    /// `YU12`
    Yuv420,
    /// `YV12`
    Yvu420,
    /// `YU16`
    Yuv422,
    /// `YV16`
    Yvu422,
    /// `YU24`
    Yuv444,
    /// `YV24`
    Yvu444,
    /// Dim placeholder.
    Dim,
    /// Unrecognized code, treated as 32-bit RGB.
    Other(u32),
}

const TABLE: &[(u32, PixelFormat)] = &[
    (fourcc(b"AR24"), PixelFormat::Argb8888),
    (fourcc(b"AB24"), PixelFormat::Abgr8888),
    (fourcc(b"RA24"), PixelFormat::Rgba8888),
    (fourcc(b"BA24"), PixelFormat::Bgra8888),
    (fourcc(b"XR24"), PixelFormat::Xrgb8888),
    (fourcc(b"XB24"), PixelFormat::Xbgr8888),
    (fourcc(b"RX24"), PixelFormat::Rgbx8888),
    (fourcc(b"BX24"), PixelFormat::Bgrx8888),
    (fourcc(b"RG24"), PixelFormat::Rgb888),
    (fourcc(b"BG24"), PixelFormat::Bgr888),
    (fourcc(b"RG16"), PixelFormat::Rgb565),
    (fourcc(b"BG16"), PixelFormat::Bgr565),
    (fourcc(b"YUYV"), PixelFormat::Yuyv),
    (fourcc(b"UYVY"), PixelFormat::Uyvy),
    (fourcc(b"YVYU"), PixelFormat::Yvyu),
    (fourcc(b"VYUY"), PixelFormat::Vyuy),
    (fourcc(b"NV12"), PixelFormat::Nv12),
    (fourcc(b"NV21"), PixelFormat::Nv21),
    (fourcc(b"YU12"), PixelFormat::Yuv420),
    (fourcc(b"YV12"), PixelFormat::Yvu420),
    (fourcc(b"YU16"), PixelFormat::Yuv422),
    (fourcc(b"YV16"), PixelFormat::Yvu422),
    (fourcc(b"YU24"), PixelFormat::Yuv444),
    (fourcc(b"YV24"), PixelFormat::Yvu444),
    (FOURCC_DIM, PixelFormat::Dim),
];

impl PixelFormat {
    /// Classify a wire fourcc.
    pub fn from_fourcc(code: u32) -> Self {
        TABLE
            .iter()
            .find(|(c, _)| *c == code)
            .map_or(Self::Other(code), |(_, f)| *f)
    }

    /// Wire fourcc of this format.
    pub fn fourcc(self) -> u32 {
        match self {
            Self::Other(code) => code,
            known => TABLE
                .iter()
                .find(|(_, f)| *f == known)
                .map_or(0, |(c, _)| *c),
        }
    }

    /// Coarse class.
    pub fn class(self) -> FormatClass {
        use PixelFormat::*;
        match self {
            Yuyv | Uyvy | Yvyu | Vyuy | Nv12 | Nv21 | Yuv420 | Yvu420 | Yuv422 | Yvu422
            | Yuv444 | Yvu444 => FormatClass::Yuv,
            Dim => FormatClass::Dim,
            _ => FormatClass::Rgb,
        }
    }

    /// Return `true` for YUV layouts.
    pub fn is_yuv(self) -> bool {
        self.class() == FormatClass::Yuv
    }

    /// Return `true` for the dim placeholder.
    pub fn is_dim(self) -> bool {
        self.class() == FormatClass::Dim
    }

    /// Memory fetched per output pixel, rounded up to whole bytes.
    pub fn bytes_per_pixel(self) -> u32 {
        use PixelFormat::*;
        match self {
            Dim => 0,
            Rgb888 | Bgr888 | Yuv444 | Yvu444 => 3,
            Rgb565 | Bgr565 | Yuyv | Uyvy | Yvyu | Vyuy | Yuv422 | Yvu422 => 2,
            // 4:2:0 fetches 1.5 bytes per pixel
            Nv12 | Nv21 | Yuv420 | Yvu420 => 2,
            _ => 4,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layering/format.rs"]
mod tests;
