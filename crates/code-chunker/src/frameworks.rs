/// Known framework and the source markers that reveal it
#[derive(Debug, Clone, Copy)]
pub struct FrameworkSignature {
    /// Canonical lowercase name used as the chunk framework tag
    pub name: &'static str,
    /// Extra spellings recognized in natural-language queries
    pub aliases: &'static [&'static str],
    /// Substrings whose presence in a file marks it as using the framework
    pub markers: &'static [&'static str],
}

/// Ordered table; more specific frameworks come before the ones they build on.
pub const FRAMEWORKS: &[FrameworkSignature] = &[
    FrameworkSignature {
        name: "nextjs",
        aliases: &["next.js", "next js"],
        markers: &["from 'next/", "from \"next/", "next/router", "getServerSideProps"],
    },
    FrameworkSignature {
        name: "react",
        aliases: &["reactjs", "react.js"],
        markers: &["from 'react'", "from \"react\"", "require('react')", "React.Component"],
    },
    FrameworkSignature {
        name: "vue",
        aliases: &["vuejs", "vue.js"],
        markers: &["from 'vue'", "from \"vue\"", "defineComponent(", "new Vue("],
    },
    FrameworkSignature {
        name: "angular",
        aliases: &["angularjs"],
        markers: &["@angular/", "@Component(", "@NgModule("],
    },
    FrameworkSignature {
        name: "nestjs",
        aliases: &["nest.js", "nest"],
        markers: &["@nestjs/"],
    },
    FrameworkSignature {
        name: "express",
        aliases: &["expressjs", "express.js"],
        markers: &["require('express')", "require(\"express\")", "from 'express'", "from \"express\""],
    },
    FrameworkSignature {
        name: "django",
        aliases: &[],
        markers: &["from django", "import django"],
    },
    FrameworkSignature {
        name: "flask",
        aliases: &[],
        markers: &["from flask", "import flask"],
    },
    FrameworkSignature {
        name: "fastapi",
        aliases: &["fast api"],
        markers: &["from fastapi", "import fastapi"],
    },
    FrameworkSignature {
        name: "spring",
        aliases: &["spring boot", "springboot"],
        markers: &["org.springframework", "@SpringBootApplication", "@RestController"],
    },
    FrameworkSignature {
        name: "rails",
        aliases: &["ruby on rails", "ror"],
        markers: &["ActiveRecord::", "ApplicationController", "Rails.application"],
    },
    FrameworkSignature {
        name: "laravel",
        aliases: &[],
        markers: &["Illuminate\\", "use Illuminate"],
    },
    FrameworkSignature {
        name: "aspnet",
        aliases: &["asp.net", "asp.net core", ".net"],
        markers: &["Microsoft.AspNetCore", "[ApiController]"],
    },
    FrameworkSignature {
        name: "axum",
        aliases: &[],
        markers: &["use axum", "axum::"],
    },
    FrameworkSignature {
        name: "actix",
        aliases: &["actix-web", "actix web"],
        markers: &["use actix_web", "actix_web::"],
    },
    FrameworkSignature {
        name: "tokio",
        aliases: &[],
        markers: &["#[tokio::main]", "use tokio", "tokio::"],
    },
];

/// Detect the first framework whose markers appear in the content
#[must_use]
pub fn detect_framework(content: &str) -> Option<&'static str> {
    FRAMEWORKS
        .iter()
        .find(|sig| sig.markers.iter().any(|marker| content.contains(marker)))
        .map(|sig| sig.name)
}

/// Look up a framework by canonical name
#[must_use]
pub fn framework_by_name(name: &str) -> Option<&'static FrameworkSignature> {
    FRAMEWORKS
        .iter()
        .find(|sig| sig.name.eq_ignore_ascii_case(name))
}
