//! Element namespaces for foreign content.
//!
//! Parsed trees hold lowercase names, as the HTML parser does. A DOM that
//! builds elements itself needs the namespace of `<svg>` and `<math>`
//! subtrees and the camel-cased SVG names back.

/// Namespace an element lives in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Namespace {
    /// Plain HTML.
    #[default]
    Html,
    /// Inside `<svg>`.
    Svg,
    /// Inside `<math>`.
    MathMl,
}

const HTML_NS: &str = "http://www.w3.org/1999/xhtml";
const SVG_NS: &str = "http://www.w3.org/2000/svg";
const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";

impl Namespace {
    /// Namespace URI.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::Html => HTML_NS,
            Self::Svg => SVG_NS,
            Self::MathMl => MATHML_NS,
        }
    }

    /// Namespace for a namespace URI reported by a DOM. Unknown is HTML.
    #[must_use]
    pub fn from_uri(uri: Option<&str>) -> Self {
        match uri {
            Some(SVG_NS) => Self::Svg,
            Some(MATHML_NS) => Self::MathMl,
            _ => Self::Html,
        }
    }

    /// Namespace of element `tag` appearing where `self` is in effect.
    #[must_use]
    pub fn of_element(self, tag: &str) -> Self {
        match tag {
            "svg" => Self::Svg,
            "math" => Self::MathMl,
            _ => self,
        }
    }

    /// Namespace in effect for the children of element `tag` in `self`.
    ///
    /// HTML integration points switch back to HTML.
    #[must_use]
    pub fn of_children(self, tag: &str) -> Self {
        match (self, tag) {
            (Self::Svg, "foreignobject" | "desc" | "title")
            | (Self::MathMl, "mi" | "mo" | "mn" | "ms" | "mtext") => Self::Html,
            _ => self,
        }
    }

    /// Local name to create element `tag` with.
    #[must_use]
    pub fn local_name(self, tag: &str) -> &str {
        if self != Self::Svg {
            return tag;
        }
        match tag {
            "altglyph" => "altGlyph",
            "altglyphdef" => "altGlyphDef",
            "altglyphitem" => "altGlyphItem",
            "animatecolor" => "animateColor",
            "animatemotion" => "animateMotion",
            "animatetransform" => "animateTransform",
            "clippath" => "clipPath",
            "feblend" => "feBlend",
            "fecolormatrix" => "feColorMatrix",
            "fecomponenttransfer" => "feComponentTransfer",
            "fecomposite" => "feComposite",
            "feconvolvematrix" => "feConvolveMatrix",
            "fediffuselighting" => "feDiffuseLighting",
            "fedisplacementmap" => "feDisplacementMap",
            "fedistantlight" => "feDistantLight",
            "fedropshadow" => "feDropShadow",
            "feflood" => "feFlood",
            "fefunca" => "feFuncA",
            "fefuncb" => "feFuncB",
            "fefuncg" => "feFuncG",
            "fefuncr" => "feFuncR",
            "fegaussianblur" => "feGaussianBlur",
            "feimage" => "feImage",
            "femerge" => "feMerge",
            "femergenode" => "feMergeNode",
            "femorphology" => "feMorphology",
            "feoffset" => "feOffset",
            "fepointlight" => "fePointLight",
            "fespecularlighting" => "feSpecularLighting",
            "fespotlight" => "feSpotLight",
            "fetile" => "feTile",
            "feturbulence" => "feTurbulence",
            "foreignobject" => "foreignObject",
            "glyphref" => "glyphRef",
            "lineargradient" => "linearGradient",
            "radialgradient" => "radialGradient",
            "textpath" => "textPath",
            _ => tag,
        }
    }

    /// Attribute name to set `name` with on an element of this namespace.
    #[must_use]
    pub fn attribute_name(self, name: &str) -> &str {
        match self {
            Self::Html => name,
            Self::MathMl => match name {
                "definitionurl" => "definitionURL",
                _ => name,
            },
            Self::Svg => match name {
                "attributename" => "attributeName",
                "attributetype" => "attributeType",
                "basefrequency" => "baseFrequency",
                "baseprofile" => "baseProfile",
                "calcmode" => "calcMode",
                "clippathunits" => "clipPathUnits",
                "diffuseconstant" => "diffuseConstant",
                "edgemode" => "edgeMode",
                "filterunits" => "filterUnits",
                "glyphref" => "glyphRef",
                "gradienttransform" => "gradientTransform",
                "gradientunits" => "gradientUnits",
                "kernelmatrix" => "kernelMatrix",
                "kernelunitlength" => "kernelUnitLength",
                "keypoints" => "keyPoints",
                "keysplines" => "keySplines",
                "keytimes" => "keyTimes",
                "lengthadjust" => "lengthAdjust",
                "limitingconeangle" => "limitingConeAngle",
                "markerheight" => "markerHeight",
                "markerunits" => "markerUnits",
                "markerwidth" => "markerWidth",
                "maskcontentunits" => "maskContentUnits",
                "maskunits" => "maskUnits",
                "numoctaves" => "numOctaves",
                "pathlength" => "pathLength",
                "patterncontentunits" => "patternContentUnits",
                "patterntransform" => "patternTransform",
                "patternunits" => "patternUnits",
                "pointsatx" => "pointsAtX",
                "pointsaty" => "pointsAtY",
                "pointsatz" => "pointsAtZ",
                "preservealpha" => "preserveAlpha",
                "preserveaspectratio" => "preserveAspectRatio",
                "primitiveunits" => "primitiveUnits",
                "refx" => "refX",
                "refy" => "refY",
                "repeatcount" => "repeatCount",
                "repeatdur" => "repeatDur",
                "requiredextensions" => "requiredExtensions",
                "requiredfeatures" => "requiredFeatures",
                "specularconstant" => "specularConstant",
                "specularexponent" => "specularExponent",
                "spreadmethod" => "spreadMethod",
                "startoffset" => "startOffset",
                "stddeviation" => "stdDeviation",
                "stitchtiles" => "stitchTiles",
                "surfacescale" => "surfaceScale",
                "systemlanguage" => "systemLanguage",
                "tablevalues" => "tableValues",
                "targetx" => "targetX",
                "targety" => "targetY",
                "textlength" => "textLength",
                "viewbox" => "viewBox",
                "viewtarget" => "viewTarget",
                "xchannelselector" => "xChannelSelector",
                "ychannelselector" => "yChannelSelector",
                "zoomandpan" => "zoomAndPan",
                _ => name,
            },
        }
    }
}

/// Namespace URI of a prefixed attribute (`xlink:href`, `xml:lang`, `xmlns:xlink`).
#[must_use]
pub fn attribute_namespace(name: &str) -> Option<&'static str> {
    if name == "xmlns" || name.starts_with("xmlns:") {
        Some(XMLNS_NS)
    } else if name.starts_with("xlink:") {
        Some(XLINK_NS)
    } else if name.starts_with("xml:") {
        Some(XML_NS)
    } else {
        None
    }
}
