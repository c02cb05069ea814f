//! Core kernel traits.
//!
//! This module defines the traits implemented by the pipeline stages:
//! - `AnalyticKernel`: base trait for all kernels
//! - `BatchKernel`: async execution trait for batch kernels

use crate::error::Result;
use crate::kernel::KernelMetadata;
use async_trait::async_trait;
use std::fmt::Debug;

/// Base trait for all analytical kernels.
///
/// Provides access to kernel metadata and configuration validation.
pub trait AnalyticKernel: Send + Sync + Debug {
    /// Returns the kernel metadata.
    fn metadata(&self) -> &KernelMetadata;

    /// Validate kernel configuration.
    ///
    /// Called before execution to ensure configuration is valid.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Returns the kernel ID.
    fn id(&self) -> &str {
        &self.metadata().id
    }
}

/// Trait for batch kernels executed once per analysis run.
///
/// # Type Parameters
///
/// - `I`: Input type
/// - `O`: Output type
#[async_trait]
pub trait BatchKernel<I, O>: AnalyticKernel
where
    I: Send + Sync,
    O: Send + Sync,
{
    /// Execute the kernel with the given input.
    async fn execute(&self, input: I) -> Result<O>;

    /// Validate the input before execution.
    ///
    /// Override to provide custom input validation.
    fn validate_input(&self, _input: &I) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;

    #[derive(Debug)]
    struct EchoKernel {
        metadata: KernelMetadata,
    }

    impl AnalyticKernel for EchoKernel {
        fn metadata(&self) -> &KernelMetadata {
            &self.metadata
        }
    }

    #[async_trait]
    impl BatchKernel<u64, u64> for EchoKernel {
        async fn execute(&self, input: u64) -> Result<u64> {
            Ok(input)
        }
    }

    #[test]
    fn test_kernel_id_from_metadata() {
        let kernel = EchoKernel {
            metadata: KernelMetadata::batch("core/echo", Domain::Core),
        };
        assert_eq!(kernel.id(), "core/echo");
        assert!(kernel.validate().is_ok());
    }
}
