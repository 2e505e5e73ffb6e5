use image::RgbaImage;

/// 帧数据结构
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // RGBA 格式
    /// 相对片段起点的采集时间（微秒）
    pub timestamp_us: u64,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>, timestamp_us: u64) -> Self {
        Self {
            width,
            height,
            data,
            timestamp_us,
        }
    }

    /// Solid-colour frame, mostly useful for synthetic clips.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], timestamp_us: u64) -> Self {
        let data = (0..width as usize * height as usize)
            .flat_map(|_| [rgb[0], rgb[1], rgb[2], 255])
            .collect();
        Self::new(width, height, data, timestamp_us)
    }

    pub fn from_image(image: RgbaImage, timestamp_us: u64) -> Self {
        let (width, height) = image.dimensions();
        Self::new(width, height, image.into_raw(), timestamp_us)
    }

    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp_us as f64 / 1_000_000.0
    }

    /// RGB at `(x, y)`, or `None` outside the buffer.
    #[inline]
    pub fn rgb_at(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width as usize || y >= self.height as usize {
            return None;
        }
        let idx = (y * self.width as usize + x) * 4;
        self.data
            .get(idx..idx + 3)
            .map(|px| [px[0], px[1], px[2]])
    }

    #[inline]
    pub fn green_at(&self, x: usize, y: usize) -> Option<u8> {
        self.rgb_at(x, y).map(|[_, g, _]| g)
    }

    pub fn set_rgb(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if x >= self.width as usize || y >= self.height as usize {
            return;
        }
        let idx = (y * self.width as usize + x) * 4;
        if let Some(px) = self.data.get_mut(idx..idx + 3) {
            px.copy_from_slice(&rgb);
        }
    }
}

/// 从原生层传递的原始帧数据（YUV_420_888，UV 平面已去交织）
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub y_plane: Vec<u8>,
    pub u_plane: Vec<u8>,
    pub v_plane: Vec<u8>,
    pub timestamp_us: u64,
}

impl RawFrame {
    pub fn to_frame(&self) -> Frame {
        let mut rgba_data = vec![0u8; (self.width * self.height * 4) as usize];
        let uv_width = (self.width / 2).max(1);

        for y in 0..self.height {
            for x in 0..self.width {
                let y_idx = (y * self.width + x) as usize;
                let uv_idx = ((y / 2) * uv_width + x / 2) as usize;

                let y_val = self.y_plane.get(y_idx).copied().unwrap_or(0) as f32;
                let u_val = self.u_plane.get(uv_idx).copied().unwrap_or(128) as f32 - 128.0;
                let v_val = self.v_plane.get(uv_idx).copied().unwrap_or(128) as f32 - 128.0;

                let r = (y_val + 1.402 * v_val).clamp(0.0, 255.0) as u8;
                let g = (y_val - 0.344136 * u_val - 0.714136 * v_val).clamp(0.0, 255.0) as u8;
                let b = (y_val + 1.772 * u_val).clamp(0.0, 255.0) as u8;

                let rgba_idx = y_idx * 4;
                rgba_data[rgba_idx] = r;
                rgba_data[rgba_idx + 1] = g;
                rgba_data[rgba_idx + 2] = b;
                rgba_data[rgba_idx + 3] = 255;
            }
        }

        Frame::new(self.width, self.height, rgba_data, self.timestamp_us)
    }
}
