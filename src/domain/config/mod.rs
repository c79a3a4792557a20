// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration domain

pub mod document;
pub mod dynamic;
pub mod params;
pub mod renderer;
pub mod schema;

// Re-export parameter types
pub use self::params::{
    parse_taints, ApiServerParams, ConfigParameters, ControllerManagerParams, EtcdParams,
    JoinParams, KubeletParams, NetworkingParams, Taint,
};

// Re-export schema selection and rendering
pub use self::renderer::{
    render, render_join, split_host_port, write_private_file, KubeadmConfigBuilder,
    RenderedDocument,
};
pub use self::schema::{select, SchemaSelection, SchemaVariant};

// Re-export dynamic configuration
pub use self::dynamic::apply_to_params;
