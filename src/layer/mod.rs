//! 图层模块
//! 统一导出 Navigator 图层数据模型与构建器

pub mod builder;
pub mod model;

pub use builder::{date_stamp, LayerBuilder, LAYER_DOMAIN};
pub use model::{
    Filters, Gradient, Layout, LegendItem, MetadataItem, NavigatorLayer, TechniqueEntry, Versions,
};
