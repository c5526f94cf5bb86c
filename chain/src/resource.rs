use crate::{access::AccessFlags, region::{ImageRegion, Region}};
use std::{fmt::Debug, ops::Range};
use syncline_core::hal;

/// Abstracts resource types that uses different access flags, layouts and regions.
pub trait Resource: Copy + Debug + 'static {
    /// Access flags for resource type.
    type Access: AccessFlags;

    /// Layout type for the resource.
    type Layout: Copy + Debug + Eq + 'static;

    /// Addressable part of the resource.
    type Region: Region;

    /// Human readable name used in logs.
    const NAME: &'static str;
}

/// Buffer resource type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Buffer;

impl Resource for Buffer {
    type Access = hal::buffer::Access;
    type Layout = ();
    type Region = Range<u64>;

    const NAME: &'static str = "buffer";
}

/// Image resource type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Image;

impl Resource for Image {
    type Access = hal::image::Access;
    type Layout = hal::image::Layout;
    type Region = ImageRegion;

    const NAME: &'static str = "image";
}

impl Image {
    /// Layout suitable for specified accesses.
    pub fn layout_for(access: hal::image::Access) -> hal::image::Layout {
        let mut acc = None;
        if access.contains(hal::image::Access::INPUT_ATTACHMENT_READ) {
            acc = Some(common_layout(acc, hal::image::Layout::ShaderReadOnlyOptimal));
        }
        if access.contains(hal::image::Access::SHADER_READ) {
            acc = Some(common_layout(acc, hal::image::Layout::ShaderReadOnlyOptimal));
        }
        if access.contains(hal::image::Access::COLOR_ATTACHMENT_READ)
            || access.contains(hal::image::Access::COLOR_ATTACHMENT_WRITE)
        {
            acc = Some(common_layout(acc, hal::image::Layout::ColorAttachmentOptimal));
        }
        if access.contains(hal::image::Access::DEPTH_STENCIL_ATTACHMENT_READ) {
            acc = Some(common_layout(
                acc,
                hal::image::Layout::DepthStencilReadOnlyOptimal,
            ));
        }
        if access.contains(hal::image::Access::DEPTH_STENCIL_ATTACHMENT_WRITE) {
            acc = Some(common_layout(
                acc,
                hal::image::Layout::DepthStencilAttachmentOptimal,
            ));
        }
        if access.contains(hal::image::Access::TRANSFER_READ) {
            acc = Some(common_layout(acc, hal::image::Layout::TransferSrcOptimal));
        }
        if access.contains(hal::image::Access::TRANSFER_WRITE) {
            acc = Some(common_layout(acc, hal::image::Layout::TransferDstOptimal));
        }
        acc.unwrap_or(hal::image::Layout::General)
    }
}

fn common_layout(
    acc: Option<hal::image::Layout>,
    layout: hal::image::Layout,
) -> hal::image::Layout {
    match (acc, layout) {
        (None, layout) => layout,
        (Some(left), right) if left == right => left,
        (
            Some(hal::image::Layout::DepthStencilReadOnlyOptimal),
            hal::image::Layout::DepthStencilAttachmentOptimal,
        ) => hal::image::Layout::DepthStencilAttachmentOptimal,
        (
            Some(hal::image::Layout::DepthStencilAttachmentOptimal),
            hal::image::Layout::DepthStencilReadOnlyOptimal,
        ) => hal::image::Layout::DepthStencilAttachmentOptimal,
        (Some(_), _) => hal::image::Layout::General,
    }
}
