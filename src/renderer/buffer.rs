//! Growable CPU staging buffers and the GPU buffers that mirror them.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("out of memory growing buffer to {requested} elements")]
    OutOfMemory { requested: usize },

    #[error("GPU buffer of {requested} bytes exceeds the device limit of {limit} bytes")]
    ExceedsDeviceLimit {
        requested: wgpu::BufferAddress,
        limit: wgpu::BufferAddress,
    },
}

/// CPU-side element storage with power-of-two growth.
///
/// Capacity never shrinks. Growth allocates the new storage first, copies the
/// existing contents forward and only then releases the old storage, so a
/// failed allocation leaves the buffer untouched.
#[derive(Debug)]
pub struct ManagedBuffer<T: bytemuck::Pod> {
    data: Vec<T>,
    len: usize,
}

impl<T: bytemuck::Pod> Default for ManagedBuffer<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T: bytemuck::Pod> ManagedBuffer<T> {
    /// Initial capacity is rounded up to a power of two.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = if capacity == 0 { 0 } else { capacity.next_power_of_two() };
        Self {
            data: vec![T::zeroed(); capacity],
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Grows to the next power of two `>= requested`. No-op when the current
    /// capacity already suffices.
    pub fn ensure_capacity(&mut self, requested: usize) -> Result<(), BufferError> {
        if requested <= self.capacity() {
            return Ok(());
        }
        let new_capacity = requested
            .checked_next_power_of_two()
            .ok_or(BufferError::OutOfMemory { requested })?;

        let mut grown: Vec<T> = Vec::new();
        grown
            .try_reserve_exact(new_capacity)
            .map_err(|_| BufferError::OutOfMemory { requested })?;
        grown.extend_from_slice(&self.data);
        grown.resize(new_capacity, T::zeroed());

        log::debug!("Grew staging buffer {} -> {new_capacity}", self.capacity());
        // Old storage drops here, after the replacement is complete.
        self.data = grown;
        Ok(())
    }

    /// Forgets the logical contents; capacity is kept.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Appends, growing when full.
    pub fn push(&mut self, value: T) -> Result<(), BufferError> {
        self.ensure_capacity(self.len + 1)?;
        self.data[self.len] = value;
        self.len += 1;
        Ok(())
    }

    /// The logically used range.
    pub fn as_slice(&self) -> &[T] {
        &self.data[..self.len]
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }

    /// The whole backing store, including unused capacity.
    pub fn storage(&self) -> &[T] {
        &self.data
    }
}

/// A GPU buffer that is written with the used range only and re-created at
/// the next power of two when the data outgrows it.
///
/// Writes go through `Queue::write_buffer`, which stages the data and lets the
/// driver keep reading the previous contents for in-flight work.
pub struct GpuBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: wgpu::Buffer,
}

impl GpuBuffer {
    const MIN_SIZE: wgpu::BufferAddress = 256;

    pub fn new(device: &wgpu::Device, label: &'static str, usage: wgpu::BufferUsages) -> Self {
        let usage = usage | wgpu::BufferUsages::COPY_DST;
        Self {
            label,
            usage,
            buffer: Self::allocate(device, label, usage, Self::MIN_SIZE),
        }
    }

    fn allocate(
        device: &wgpu::Device,
        label: &'static str,
        usage: wgpu::BufferUsages,
        size: wgpu::BufferAddress,
    ) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        })
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn size(&self) -> wgpu::BufferAddress {
        self.buffer.size()
    }

    /// Size to reallocate to so that `needed` bytes fit, or `None` when the
    /// current buffer is large enough. Rounds up to a power of two, capped at
    /// the device's `limit`.
    fn grown_size(
        needed: wgpu::BufferAddress,
        current: wgpu::BufferAddress,
        limit: wgpu::BufferAddress,
    ) -> Result<Option<wgpu::BufferAddress>, BufferError> {
        if needed <= current {
            return Ok(None);
        }
        let limit = limit - limit % wgpu::COPY_BUFFER_ALIGNMENT;
        if needed > limit {
            return Err(BufferError::ExceedsDeviceLimit {
                requested: needed,
                limit,
            });
        }
        let size = needed
            .checked_next_power_of_two()
            .unwrap_or(limit)
            .max(Self::MIN_SIZE)
            .min(limit);
        Ok(Some(size))
    }

    /// Uploads `bytes` at offset zero. Returns `true` when the buffer had to
    /// be replaced by a larger one. Fails without touching the current buffer
    /// when the data cannot fit any buffer the device allows.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
    ) -> Result<bool, BufferError> {
        if bytes.is_empty() {
            return Ok(false);
        }
        let needed = (bytes.len() as wgpu::BufferAddress).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        let limit = device.limits().max_buffer_size;
        let mut replaced = false;
        if let Some(size) = Self::grown_size(needed, self.buffer.size(), limit)? {
            log::info!(
                "Reallocating {} from {} to {size} bytes",
                self.label,
                self.buffer.size()
            );
            // Replace first; the old buffer is released once in-flight work is done with it.
            self.buffer = Self::allocate(device, self.label, self.usage, size);
            replaced = true;
        }

        if bytes.len() as wgpu::BufferAddress == needed {
            queue.write_buffer(&self.buffer, 0, bytes);
        } else {
            let mut padded = bytes.to_vec();
            padded.resize(needed as usize, 0);
            queue.write_buffer(&self.buffer, 0, &padded);
        }
        Ok(replaced)
    }

    pub fn destroy(&self) {
        self.buffer.destroy();
    }
}
