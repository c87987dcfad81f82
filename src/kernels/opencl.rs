// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! OpenCL backend for user-supplied binary matmul kernels.
//!
//! The kernel source is built at runtime for the first usable device. GPUs
//! are tried first unless disabled in [`KernelBackendConfig`]; any other
//! device is used as a fallback. Arguments are bound in contract order
//! (see [`crate::kernels::backend`]) and the kernel is launched over an
//! `M×N` range with a driver-chosen local size.

use std::fmt;
use std::path::Path;
use std::ptr;

use opencl3::command_queue::CommandQueue;
use opencl3::context::Context;
use opencl3::device::{get_all_devices, Device, CL_DEVICE_TYPE_ALL, CL_DEVICE_TYPE_GPU};
use opencl3::kernel::{ExecuteKernel, Kernel};
use opencl3::memory::{Buffer, CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY};
use opencl3::program::Program;
use opencl3::types::{cl_device_id, cl_int, cl_mem_flags, cl_uint, cl_ulong, CL_BLOCKING};

use crate::config::KernelBackendConfig;
use crate::error::{BitGemmError, Result};
use crate::kernels::backend::{BinaryMatmulKernel, KernelLaunch};
use crate::memory::{format_bytes, LaunchFootprint};

/// A built OpenCL binary matmul kernel bound to one device.
pub struct OpenClKernel {
    device: Device,
    device_name: String,
    context: Context,
    queue: CommandQueue,
    kernel: Kernel,
    entry_point: String,
    memory_limit: Option<usize>,
}

impl fmt::Debug for OpenClKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenClKernel")
            .field("device_name", &self.device_name)
            .field("entry_point", &self.entry_point)
            .field("memory_limit", &self.memory_limit)
            .finish_non_exhaustive()
    }
}

/// Candidate device ids, GPUs first when `prefer_gpu` is set.
fn candidate_devices(prefer_gpu: bool) -> Result<Vec<cl_device_id>> {
    let all = get_all_devices(CL_DEVICE_TYPE_ALL).map_err(|e| {
        BitGemmError::DeviceNotAvailable(format!("No OpenCL platforms found. CL error code: {}", e.0))
    })?;

    let mut ids = if prefer_gpu {
        get_all_devices(CL_DEVICE_TYPE_GPU).unwrap_or_default()
    } else {
        Vec::new()
    };
    if prefer_gpu && ids.is_empty() {
        tracing::warn!("no OpenCL GPU found, falling back to any device");
    }
    for id in all {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    if ids.is_empty() {
        return Err(BitGemmError::DeviceNotAvailable(
            "No OpenCL devices found.".to_string(),
        ));
    }
    Ok(ids)
}

impl OpenClKernel {
    /// Read OpenCL C source from `path` and build it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or see
    /// [`Self::from_source`].
    pub fn from_source_file(path: impl AsRef<Path>, config: &KernelBackendConfig) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        tracing::debug!("read kernel source from {}", path.display());
        Self::from_source(&source, config)
    }

    /// Build `source` for the first device that accepts a context and queue.
    ///
    /// # Errors
    ///
    /// Returns [`BitGemmError::DeviceNotAvailable`] if no device can be
    /// opened, [`BitGemmError::KernelBuild`] with the build log if the source
    /// does not compile, or [`BitGemmError::InvalidConfig`] for a bad config.
    pub fn from_source(source: &str, config: &KernelBackendConfig) -> Result<Self> {
        config.validate()?;

        let mut opened = None;
        for id in candidate_devices(config.prefer_gpu)? {
            let device = Device::new(id);
            let Ok(context) = Context::from_device(&device) else {
                continue;
            };
            #[allow(deprecated)]
            let Ok(queue) = CommandQueue::create_default(&context, 0) else {
                continue;
            };
            opened = Some((device, context, queue));
            break;
        }
        let (device, context, queue) = opened.ok_or_else(|| {
            BitGemmError::DeviceNotAvailable("no device accepted a context and queue".to_string())
        })?;

        let device_name = device.name().unwrap_or_default().trim().to_string();
        tracing::info!("Using OpenCL device: {device_name}");

        let program =
            Program::create_and_build_from_source(&context, source, &config.build_options)
                .map_err(BitGemmError::KernelBuild)?;
        let kernel = Kernel::create(&program, &config.entry_point).map_err(|e| {
            BitGemmError::KernelBuild(format!(
                "entry point '{}' not found. CL error code: {}",
                config.entry_point, e.0
            ))
        })?;

        Ok(Self {
            device,
            device_name,
            context,
            queue,
            kernel,
            entry_point: config.entry_point.clone(),
            memory_limit: config.memory_limit,
        })
    }

    /// Name reported by the device.
    #[must_use]
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Smaller of the configured limit and the device's global memory.
    fn memory_limit(&self) -> Option<usize> {
        let device_mem = self
            .device
            .global_mem_size()
            .ok()
            .and_then(|b| usize::try_from(b).ok());
        match (self.memory_limit, device_mem) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn create_buffer<T>(&self, flags: cl_mem_flags, len: usize) -> Result<Buffer<T>> {
        // SAFETY: no host pointer is passed; the buffer owns its storage.
        unsafe { Buffer::<T>::create(&self.context, flags, len, ptr::null_mut()) }.map_err(|e| {
            BitGemmError::Kernel(format!("Failed to create buffer. CL error code: {}", e.0))
        })
    }
}

fn scalar(value: usize) -> cl_ulong {
    value as cl_ulong
}

impl BinaryMatmulKernel for OpenClKernel {
    fn name(&self) -> &str {
        "opencl"
    }

    fn launch(&self, launch: &KernelLaunch) -> Result<Vec<i32>> {
        launch.validate()?;

        let footprint = LaunchFootprint::of(launch);
        footprint.check(self.memory_limit())?;
        tracing::debug!(
            "OpenCL launch on {}: {} of device buffers",
            self.device_name,
            format_bytes(footprint.total())
        );

        let a_words = launch.packed_a.words();
        let b_words = launch.packed_b.words();
        let mut a_buf = self.create_buffer::<cl_uint>(CL_MEM_READ_ONLY, a_words.len())?;
        let mut b_buf = self.create_buffer::<cl_uint>(CL_MEM_READ_ONLY, b_words.len())?;
        let out_buf = self.create_buffer::<cl_int>(CL_MEM_WRITE_ONLY, launch.output_len())?;

        // SAFETY: blocking writes from live host slices of the buffer's length.
        unsafe {
            self.queue
                .enqueue_write_buffer(&mut a_buf, CL_BLOCKING, 0, a_words, &[])
                .map_err(|e| {
                    BitGemmError::Kernel(format!("Failed to write buffer. CL error code: {}", e.0))
                })?;
            self.queue
                .enqueue_write_buffer(&mut b_buf, CL_BLOCKING, 0, b_words, &[])
                .map_err(|e| {
                    BitGemmError::Kernel(format!("Failed to write buffer. CL error code: {}", e.0))
                })?;
        }

        let m = scalar(launch.m);
        let n = scalar(launch.n);
        let k = scalar(launch.k);
        let chunks = scalar(launch.chunks);
        let mask: cl_uint = launch.last_word_mask;

        tracing::info!("Launching OpenCL kernel '{}'", self.entry_point);
        // SAFETY: argument order and types follow the kernel contract.
        let event = unsafe {
            ExecuteKernel::new(&self.kernel)
                .set_arg(&a_buf)
                .set_arg(&b_buf)
                .set_arg(&out_buf)
                .set_arg(&m)
                .set_arg(&n)
                .set_arg(&k)
                .set_arg(&chunks)
                .set_arg(&mask)
                .set_global_work_sizes(&[launch.m, launch.n])
                .enqueue_nd_range(&self.queue)
                .map_err(|e| {
                    BitGemmError::Kernel(format!(
                        "Failed to enqueue kernel. CL error code: {}",
                        e.0
                    ))
                })?
        };
        event.wait().map_err(|e| {
            BitGemmError::Kernel(format!(
                "Failed to finalize the queue. CL error code: {}",
                e.0
            ))
        })?;

        let mut output: Vec<cl_int> = vec![0; launch.output_len()];
        // SAFETY: blocking read into a host slice of the buffer's length.
        unsafe {
            self.queue
                .enqueue_read_buffer(&out_buf, CL_BLOCKING, 0, &mut output, &[])
                .map_err(|e| {
                    BitGemmError::Kernel(format!("Failed to read buffer. CL error code: {}", e.0))
                })?;
        }

        tracing::info!("Kernel execution completed successfully!");
        Ok(output)
    }
}
