use crate::detection::Detection;
use crate::error::Error;

pub struct Frame {
    /// 1-based position of the frame in the stream
    pub index: u64,
    /// Original (width, height), before any processing downscale
    pub dims: (u32, u32),
    /// Detector output in processing coordinates
    pub detections: Vec<Detection>,
}

impl Frame {
    pub fn new(index: u64, dims: (u32, u32), detections: Vec<Detection>) -> Self {
        Self {
            index,
            dims,
            detections,
        }
    }

    /// Parses a `<index>:<json detections>` line of a detection dump
    pub fn parse_dump_line(line: &str, dims: (u32, u32)) -> Result<Self, Error> {
        let idx = line
            .find(':')
            .ok_or_else(|| Error::Dump("expected `:`".into()))?;

        let (index, vector) = line.split_at(idx);
        let index = index
            .trim()
            .parse::<u64>()
            .map_err(|e| Error::Dump(format!("bad frame index `{}`: {}", index, e)))?;

        let detections = serde_json::from_str(&vector[1..])?;

        Ok(Self::new(index, dims, detections))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}
