use fixed::types::I32F32;

/// Length in PDF points, backed by a binary fixed-point value so that
/// repeated layout arithmetic stays exact and reproducible across runs
/// and platforms.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Pt(I32F32);

pub const MM_PER_INCH: f32 = 25.4;
pub const PT_PER_INCH: f32 = 72.0;

impl Pt {
    pub const ZERO: Pt = Pt(I32F32::from_bits(0));

    pub fn from_f32(value: f32) -> Pt {
        if !value.is_finite() {
            return Pt::ZERO;
        }
        // Keep inside the fixed-point range; page geometry never gets
        // anywhere near this.
        let value = value.clamp(-1.0e9, 1.0e9);
        Pt(I32F32::from_num(value))
    }

    pub fn from_mm(value: f32) -> Pt {
        Pt::from_f32(value * PT_PER_INCH / MM_PER_INCH)
    }

    pub fn to_f32(self) -> f32 {
        self.0.to_num()
    }

    pub fn max(self, other: Pt) -> Pt {
        if self >= other { self } else { other }
    }

    pub fn min(self, other: Pt) -> Pt {
        if self <= other { self } else { other }
    }
}

impl std::ops::Add for Pt {
    type Output = Pt;
    fn add(self, rhs: Pt) -> Pt {
        Pt(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for Pt {
    type Output = Pt;
    fn sub(self, rhs: Pt) -> Pt {
        Pt(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::Mul<i32> for Pt {
    type Output = Pt;
    fn mul(self, rhs: i32) -> Pt {
        Pt(self.0.saturating_mul(I32F32::from_num(rhs)))
    }
}

impl std::ops::Div<i32> for Pt {
    type Output = Pt;
    fn div(self, rhs: i32) -> Pt {
        if rhs == 0 {
            Pt::ZERO
        } else {
            Pt(self.0 / I32F32::from_num(rhs))
        }
    }
}

impl std::ops::Mul<f32> for Pt {
    type Output = Pt;
    fn mul(self, rhs: f32) -> Pt {
        if !rhs.is_finite() {
            return Pt::ZERO;
        }
        Pt::from_f32(self.to_f32() * rhs)
    }
}

impl std::ops::Neg for Pt {
    type Output = Pt;
    fn neg(self) -> Pt {
        Pt(I32F32::from_bits(0).saturating_sub(self.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: Pt,
    pub height: Pt,
}

impl Size {
    pub fn from_mm(width_mm: f32, height_mm: f32) -> Self {
        Self {
            width: Pt::from_mm(width_mm),
            height: Pt::from_mm(height_mm),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: Pt,
    pub y: Pt,
    pub width: Pt,
    pub height: Pt,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn gray(level: f32) -> Self {
        Self {
            r: level,
            g: level,
            b: level,
        }
    }
}

/// Physical paper sizes supported by the sheet generator. Dimensions are
/// the portrait width x height in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageSize {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

impl PageSize {
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PageSize::A3 => (297.0, 420.0),
            PageSize::A4 => (210.0, 297.0),
            PageSize::A5 => (148.0, 210.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Legal => (215.9, 355.6),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Effective page dimensions in millimeters after applying orientation.
pub fn oriented_dimensions_mm(page_size: PageSize, orientation: Orientation) -> (f32, f32) {
    let (w, h) = page_size.dimensions_mm();
    match orientation {
        Orientation::Portrait => (w, h),
        Orientation::Landscape => (h, w),
    }
}

pub fn oriented_size(page_size: PageSize, orientation: Orientation) -> Size {
    let (w, h) = oriented_dimensions_mm(page_size, orientation);
    Size::from_mm(w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pt_mm_round_trip_is_exactish() {
        let a4 = Pt::from_mm(210.0);
        let back = a4.to_f32() * MM_PER_INCH / PT_PER_INCH;
        assert!((back - 210.0).abs() < 0.001);
    }

    #[test]
    fn pt_arithmetic_is_deterministic() {
        let cell = Pt::from_mm(34.0);
        let a = (cell * 5) / 5;
        assert_eq!(a, cell);
        let sum = Pt::from_f32(10.0) + Pt::from_f32(20.0);
        assert_eq!(sum, Pt::from_f32(30.0));
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let portrait = oriented_dimensions_mm(PageSize::A4, Orientation::Portrait);
        let landscape = oriented_dimensions_mm(PageSize::A4, Orientation::Landscape);
        assert_eq!(portrait, (210.0, 297.0));
        assert_eq!(landscape, (297.0, 210.0));
    }

    #[test]
    fn letter_dimensions() {
        assert_eq!(PageSize::Letter.dimensions_mm(), (215.9, 279.4));
    }
}
