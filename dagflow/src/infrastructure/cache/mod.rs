// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Cache backend adapters implementing `dagflow_domain::CacheBackend`, and
//! [`dag_cache::DagCache`], the typed wrapper that (de)serializes a
//! [`dagflow_domain::State`] into the backend's opaque [`CachePayload`].

pub mod dag_cache;
pub mod disk;
pub mod file_lock;
pub mod memory;

pub use dag_cache::DagCache;
pub use disk::{DiskCacheBackend, SharedDiskCacheBackend};
pub use memory::MemoryCacheBackend;
