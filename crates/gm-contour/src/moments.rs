use gm_core::{ImageView, Point2d, Point2i};

/// Raw spatial moments up to third order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m20: f64,
    pub m11: f64,
    pub m02: f64,
    pub m30: f64,
    pub m21: f64,
    pub m12: f64,
    pub m03: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CentralMoments {
    pub mu20: f64,
    pub mu11: f64,
    pub mu02: f64,
    pub mu30: f64,
    pub mu21: f64,
    pub mu12: f64,
    pub mu03: f64,
}

impl Moments {
    /// Moments of the region enclosed by a closed polygon (Green's theorem).
    ///
    /// The result does not depend on orientation. Polygons with
    /// `|area| <= f32::EPSILON` yield all-zero moments.
    pub fn from_polygon(points: &[Point2i]) -> Moments {
        let n = points.len();
        if n == 0 {
            return Moments::default();
        }

        let mut a = [0.0f64; 10];
        let mut prev = points[n - 1];
        for &p in points {
            let (xi_1, yi_1) = (f64::from(prev.x), f64::from(prev.y));
            let (xi, yi) = (f64::from(p.x), f64::from(p.y));
            prev = p;

            let xi2 = xi * xi;
            let yi2 = yi * yi;
            let xi_12 = xi_1 * xi_1;
            let yi_12 = yi_1 * yi_1;
            let dxy = xi_1 * yi - xi * yi_1;
            let xii_1 = xi_1 + xi;
            let yii_1 = yi_1 + yi;

            a[0] += dxy;
            a[1] += dxy * xii_1;
            a[2] += dxy * yii_1;
            a[3] += dxy * (xi_1 * xii_1 + xi2);
            a[4] += dxy * (xi_1 * (yii_1 + yi_1) + xi * (yii_1 + yi));
            a[5] += dxy * (yi_1 * yii_1 + yi2);
            a[6] += dxy * xii_1 * (xi_12 + xi2);
            a[7] += dxy
                * (xi_12 * (3.0 * yi_1 + yi) + 2.0 * xi * xi_1 * yii_1 + xi2 * (yi_1 + 3.0 * yi));
            a[8] += dxy
                * (yi_12 * (3.0 * xi_1 + xi) + 2.0 * yi * yi_1 * xii_1 + yi2 * (xi_1 + 3.0 * xi));
            a[9] += dxy * yii_1 * (yi_12 + yi2);
        }

        if a[0].abs() <= f64::from(f32::EPSILON) {
            return Moments::default();
        }

        let s = a[0].signum();
        Moments {
            m00: a[0] * 0.5 * s,
            m10: a[1] / 6.0 * s,
            m01: a[2] / 6.0 * s,
            m20: a[3] / 12.0 * s,
            m11: a[4] / 24.0 * s,
            m02: a[5] / 12.0 * s,
            m30: a[6] / 20.0 * s,
            m21: a[7] / 60.0 * s,
            m12: a[8] / 60.0 * s,
            m03: a[9] / 20.0 * s,
        }
    }

    /// Intensity-weighted moments with pixel centers at integer coordinates.
    pub fn from_image<T: Copy + Into<f64>>(img: &ImageView<'_, T>) -> Moments {
        let mut m = Moments::default();
        for y in 0..img.height() {
            let yf = y as f64;
            let (mut s0, mut s1, mut s2, mut s3) = (0.0, 0.0, 0.0, 0.0);
            for (x, &v) in img.row(y).iter().enumerate() {
                let v: f64 = v.into();
                if v == 0.0 {
                    continue;
                }
                let xf = x as f64;
                s0 += v;
                s1 += v * xf;
                s2 += v * xf * xf;
                s3 += v * xf * xf * xf;
            }

            m.m00 += s0;
            m.m10 += s1;
            m.m20 += s2;
            m.m30 += s3;
            m.m01 += s0 * yf;
            m.m11 += s1 * yf;
            m.m21 += s2 * yf;
            m.m02 += s0 * yf * yf;
            m.m12 += s1 * yf * yf;
            m.m03 += s0 * yf * yf * yf;
        }
        m
    }

    pub fn centroid(&self) -> Option<Point2d> {
        if self.m00 == 0.0 {
            return None;
        }
        Some(Point2d::new(self.m10 / self.m00, self.m01 / self.m00))
    }

    pub fn central(&self) -> CentralMoments {
        if self.m00 == 0.0 {
            return CentralMoments::default();
        }

        let cx = self.m10 / self.m00;
        let cy = self.m01 / self.m00;
        let mu20 = self.m20 - self.m10 * cx;
        let mu11 = self.m11 - self.m10 * cy;
        let mu02 = self.m02 - self.m01 * cy;
        CentralMoments {
            mu20,
            mu11,
            mu02,
            mu30: self.m30 - cx * (3.0 * mu20 + cx * self.m10),
            mu21: self.m21 - cx * (2.0 * mu11 + cx * self.m01) - cy * mu20,
            mu12: self.m12 - cy * (2.0 * mu11 + cy * self.m10) - cx * mu02,
            mu03: self.m03 - cy * (3.0 * mu02 + cy * self.m01),
        }
    }

    /// The seven Hu invariants of the normalized central moments.
    pub fn hu(&self) -> [f64; 7] {
        if self.m00 == 0.0 {
            return [0.0; 7];
        }

        let c = self.central();
        let s2 = self.m00 * self.m00;
        let s3 = s2 * self.m00.sqrt();
        let (n20, n11, n02) = (c.mu20 / s2, c.mu11 / s2, c.mu02 / s2);
        let (n30, n21, n12, n03) = (c.mu30 / s3, c.mu21 / s3, c.mu12 / s3, c.mu03 / s3);

        let mut t0 = n30 + n12;
        let mut t1 = n21 + n03;
        let mut q0 = t0 * t0;
        let mut q1 = t1 * t1;
        let n4 = 4.0 * n11;
        let s = n20 + n02;
        let d = n20 - n02;

        let mut hu = [0.0; 7];
        hu[0] = s;
        hu[1] = d * d + n4 * n11;
        hu[3] = q0 + q1;
        hu[5] = d * (q0 - q1) + n4 * t0 * t1;

        t0 *= q0 - 3.0 * q1;
        t1 *= 3.0 * q0 - q1;
        q0 = n30 - 3.0 * n12;
        q1 = 3.0 * n21 - n03;

        hu[2] = q0 * q0 + q1 * q1;
        hu[4] = q0 * t0 + q1 * t1;
        hu[6] = q1 * t0 - q0 * t1;
        hu
    }
}
