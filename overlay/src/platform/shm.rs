//! Anonymous shared memory for handing pixels to the display server

use std::os::fd::{AsFd, OwnedFd};
use std::ptr::NonNull;

use rustix::fs::{MemfdFlags, memfd_create};
use rustix::mm::{MapFlags, ProtFlags, mmap, munmap};

use super::PlatformError;

/// A memfd mapped read/write into this process
pub(crate) struct ShmSegment {
    fd: OwnedFd,
    ptr: NonNull<u8>,
    size: usize,
}

impl ShmSegment {
    pub fn new(size: usize) -> Result<Self, PlatformError> {
        if size == 0 {
            return Err(PlatformError::BufferError("empty buffer".to_string()));
        }

        let fd = memfd_create(c"activate-linux-buffer", MemfdFlags::CLOEXEC)
            .map_err(|e| PlatformError::BufferError(format!("memfd_create failed: {}", e)))?;

        rustix::fs::ftruncate(&fd, size as u64)
            .map_err(|e| PlatformError::BufferError(format!("ftruncate failed: {}", e)))?;

        // SAFETY: fresh mapping of a file we own, sized above
        let ptr = unsafe {
            mmap(
                std::ptr::null_mut(),
                size,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                fd.as_fd(),
                0,
            )
            .map_err(|e| PlatformError::BufferError(format!("mmap failed: {}", e)))?
        };

        let ptr = NonNull::new(ptr.cast::<u8>())
            .ok_or_else(|| PlatformError::BufferError("mmap returned null".to_string()))?;

        Ok(Self { fd, ptr, size })
    }

    #[cfg(feature = "wayland")]
    pub fn fd(&self) -> std::os::fd::BorrowedFd<'_> {
        self.fd.as_fd()
    }

    #[cfg(feature = "x11")]
    /// Duplicate the file descriptor, for APIs that take ownership of it
    pub fn clone_fd(&self) -> Result<OwnedFd, PlatformError> {
        self.fd
            .try_clone()
            .map_err(|e| PlatformError::BufferError(format!("dup failed: {}", e)))
    }

    #[cfg(test)]
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: ptr/size describe our live mapping; &mut self gives exclusive access
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.size) }
    }

    /// Copy renderer output (RGBA) into the segment as BGRA, which is what
    /// both `ARGB8888` on Wayland and 32-bit Z-pixmaps on X11 expect on
    /// little-endian machines.
    pub fn write_bgra(&mut self, rgba: &[u8]) {
        rgba_to_bgra(rgba, self.as_mut_slice());
    }
}

impl Drop for ShmSegment {
    fn drop(&mut self) {
        // SAFETY: unmapping the region created in `new`, exactly once
        unsafe {
            munmap(self.ptr.as_ptr().cast(), self.size).ok();
        }
    }
}

/// Byte length of a 32-bit frame, bounded by what a `wl_shm` pool can address
pub(crate) fn frame_len(width: u32, height: u32) -> Result<usize, PlatformError> {
    width
        .checked_mul(4)
        .and_then(|stride| stride.checked_mul(height))
        .filter(|&len| len <= i32::MAX as u32)
        .map(|len| len as usize)
        .ok_or_else(|| PlatformError::BufferError(format!("{}x{} frame too large", width, height)))
}

pub(crate) fn rgba_to_bgra(src: &[u8], dst: &mut [u8]) {
    for (from, to) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        to[0] = from[2]; // B
        to[1] = from[1]; // G
        to[2] = from[0]; // R
        to[3] = from[3]; // A
    }
}
