// src/pipeline/styles.rs

/// One restyling preset. `prompt` contains the `[SUBJECT]` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    /// Automatic styles run as soon as a subject is known.
    pub auto: bool,
    pub prompt: &'static str,
}

pub const SUBJECT_PLACEHOLDER: &str = "[SUBJECT]";

impl StyleDefinition {
    pub fn render_prompt(&self, subject: &str) -> String {
        self.prompt.replace(SUBJECT_PLACEHOLDER, subject)
    }
}

/// Ordered set of styles offered by the gallery.
#[derive(Debug, Clone)]
pub struct StyleCatalog {
    styles: Vec<StyleDefinition>,
}

impl StyleCatalog {
    pub fn new(styles: Vec<StyleDefinition>) -> Self {
        Self { styles }
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_STYLES.to_vec())
    }

    pub fn get(&self, id: &str) -> Option<&StyleDefinition> {
        self.styles.iter().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleDefinition> {
        self.styles.iter()
    }

    pub fn automatic(&self) -> impl Iterator<Item = &StyleDefinition> {
        self.styles.iter().filter(|s| s.auto)
    }
}

impl Default for StyleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

pub const BUILTIN_STYLES: &[StyleDefinition] = &[
    StyleDefinition {
        id: "moody_macro",
        label: "Moody Macro",
        description: "100mm Macro Chiaroscuro",
        auto: true,
        prompt: "Enhanced image of [SUBJECT] simulating a Camera Lens (Focal Length): 85mm to 100mm (Macro). Aperture: f/1.8 to f/2.8. Shutter Speed: 1/200 to 1/400s. ISO: 100 to 400. Composition & Lighting Setup Lighting (Chiaroscuro/Moody): This is a \"Dark and Moody\" style. Angle: Eye-level / 15-degree angle. The camera is almost level with the middle of the [SUBJECT], making it look towering and impressive. Professional culinary photography, close-up macro shot. Lighting is dark and moody (Chiaroscuro), with soft directional light hitting the subject from the left to create deep, dramatic shadows and rich highlights. Shot on a 100mm Macro lens at aperture f/1.8 for a creamy bokeh background. Razor-sharp focus on textures. 8k resolution, photorealistic, cinematic lighting, no grain.",
    },
    StyleDefinition {
        id: "high_speed",
        label: "High-Speed",
        description: "Exploded View Levitation",
        auto: true,
        prompt: "Professional high-speed commercial food photography of [SUBJECT], vertical \"exploded view\". The ingredients/parts are levitating and suspended in mid-air in distinct, separated layers. A human hand holds the base from below, and another hand releases the top part from above. Dramatic swirls of white smoke and steam weaving through the floating layers. Jet black background. Lighting is dramatic rim-lighting and backlighting to highlight the edges. Shot on 85mm lens, aperture f/8 for deep focus, freeze motion shutter speed 1/1000s, sharp focus on all layers, hyper-detailed, 8k, advertising standard.",
    },
    StyleDefinition {
        id: "rustic_macro",
        label: "Rustic Macro",
        description: "Natural Light Close-Up",
        auto: true,
        prompt: "Professional rustic food photography of [SUBJECT], close-up macro shot. Lighting is soft, diffused, natural window light from the left, creating soft shadows. Shot on 100mm Macro lens, aperture f/2.0, shallow depth of field, creamy bokeh background, hyper-realistic texture on the fruit and cream, 8k.",
    },
    StyleDefinition {
        id: "moody_flat_lay",
        label: "Moody Flat Lay",
        description: "Concrete Texture Top-Down",
        auto: true,
        prompt: "Professional culinary food photography of [SUBJECT], 90-degree top-down flat lay. Plated on a dark grey textured concrete stone surface. A dark grey linen napkin on the right side. Lighting is moody and organic, soft directional light from the left revealing textures. Shot on 50mm lens, aperture f/5.6 for edge-to-edge sharpness, hyper-realistic, rich colours, 8k resolution.",
    },
    StyleDefinition {
        id: "editorial_diptych",
        label: "Editorial Diptych",
        description: "Split-Screen Story",
        auto: true,
        prompt: "A split-screen diptych of high-end editorial food photography of [SUBJECT]. [Left Side]: Shot with an 85mm lens at f/1.8, blurry background, soft natural window light from the left, moody atmosphere. [Right Side]: A flat-lay overhead shot. Overall Style: Dark and moody, chiaroscuro lighting, ultra-realistic, 8k resolution, phase one camera capture.",
    },
    StyleDefinition {
        id: "surprise",
        label: "Surprise Me",
        description: "AI Creative Choice",
        auto: true,
        prompt: "Creatively style this photo of [SUBJECT]. Choose a unique, random aesthetic (e.g., Neon Noir, Vintage 70s, Ethereal, Pop Art, or Futuristic) that makes the subject look stunning and unexpected. Keep the subject recognizable but completely transform the mood and lighting.",
    },
    StyleDefinition {
        id: "culinary_mag",
        label: "Magazine Style",
        description: "Low Key & Rich",
        auto: false,
        prompt: "Food photography of [SUBJECT], Soft, moody window light coming from the left creating deep shadows. Shallow depth of field, f/1.8, 85mm lens, creamy bokeh background. In the foreground, out-of-focus. High contrast, low key lighting, rich textures, culinary magazine style.",
    },
    StyleDefinition {
        id: "rustic_flat_lay",
        label: "Rustic Flat Lay",
        description: "Dark Oak Table",
        auto: false,
        prompt: "Overhead flat lay food photography of [SUBJECT]. The surface is a dark, scratched oak table. A linen napkin on the side. Sharp focus, f/8, high texture detail, dark moody lighting, natural light.",
    },
    StyleDefinition {
        id: "chiaroscuro_flat",
        label: "Chiaroscuro Flat",
        description: "Deep Shadows",
        auto: false,
        prompt: "Top-down flat lay food photography of [SUBJECT]. Background is a dark textured slate surface with a crumpled dark grey linen napkin underneath. Artistic scattering of flour or sea salt on the dark table. Lighting is dark and moody, chiaroscuro style, heavy shadows, directional window light from the left. High contrast, rich textures, hyper-realistic, 8k resolution, shot on 50mm lens, f/5.6, professional food styling.",
    },
    StyleDefinition {
        id: "fine_dining",
        label: "Fine Dining",
        description: "Michelin Plating",
        auto: false,
        prompt: "Top-down food photography of [SUBJECT]. Background is a weathered wooden table. Natural soft window lighting, high contrast, rich textures, photorealistic, Michelin star plating, 8k resolution.",
    },
    StyleDefinition {
        id: "vibrant_macro",
        label: "Vibrant Macro",
        description: "Food Porn Style",
        auto: false,
        prompt: "Flat lay food photography of [SUBJECT], macro shot, bokeh. Rustic wood surface. 50mm lens, f/2.8, soft daylight, volumetric lighting, appetizing, food porn, highly detailed, sharp focus, 8k, ray tracing, vibrant red and orange tones.",
    },
    StyleDefinition {
        id: "dynamic_macro",
        label: "Dynamic Macro",
        description: "Suspended Motion",
        auto: false,
        prompt: "A dynamic high-speed macro food photograph capturing [SUBJECT] suspended in mid-air, levitating above it own plate. The lighting is dramatic and moody chiaroscuro side-lighting from the left, heavily bokeh background of dark kitchen shelves. The focus is razor-sharp on the flying elements. 8k resolution, highly detailed texture.",
    },
    StyleDefinition {
        id: "frozen_motion",
        label: "Frozen Motion",
        description: "Zero Blur",
        auto: false,
        prompt: "A vertical, high-speed macro photograph capturing a dynamic shot of [SUBJECT]. The lighting is dramatic chiaroscuro from the back-left, deep black background. The background is extremely dark and heavily blurred (bokeh), showing faint outlines. Razor-sharp focus on the ingredients. Frozen motion, no blur. Shot on a 100mm macro lens. 8k resolution, altamente detailed.",
    },
    StyleDefinition {
        id: "high_key",
        label: "High-Key",
        description: "Bright & Airy",
        auto: false,
        prompt: "A high-key, overhead flat lay food photograph of [SUBJECT]. The lighting is bright, soft, diffused natural daylight with no harsh shadows. The focus is sharp across the entire frame. Shot on a 50mm lens at f/8.",
    },
    StyleDefinition {
        id: "summer_feast",
        label: "Summer Feast",
        description: "Rustic Garden",
        auto: false,
        prompt: "A top-down flat lay food photograph of a rustic, communal summer gathering. The centrepiece is [SUBJECT] on a large wooden table. Surrounding the main ingredients. Vintage silver cutlery, small ornamentals, scattered ingredients, and tiny floral sprigs decorate the table. The lighting is soft, diffused natural daylight, creating a warm and cozy atmosphere. The focus is sharp across the entire frame (deep depth of field). Shot on a 50mm lens at f/8.",
    },
    StyleDefinition {
        id: "chef_portrait",
        label: "Chef Portrait",
        description: "Held by Chef",
        auto: false,
        prompt: "A moody, close-up portrait photograph of [SUBJECT] held in the hands of an unseen person wearing a black chef jacket top with \"Mestizo\" , \"Restaurant & Margarita Bar\" on the top right of the chef jacket top. Font: Bauer Bodoni, one line subtitle: Bauer Bodoni italic, smaller size. The lighting is dramatic and soft natural side-light from the left (chiaroscuro style), emphasizing the textures of the ingredients against a dark, shadowed background. The depth of field is extremely shallow, with razor-sharp focus only on the front ingredients of the dish, while the person’s pleated clothing behind it renders into a smooth, creamy bokeh blur. Shot on an 85mm f/1.4 lens. Rich autumn colour tones. Film grain texture.",
    },
    StyleDefinition {
        id: "ceviche_style",
        label: "Ceviche Style",
        description: "Fresh & Detailed",
        auto: false,
        prompt: "An overhead photograph of a rustic summer feast, captured with a 35mm lens at f/4. The scene, shot on a wooden table, features [SUBJECT] meticulously arranged in a textured teal ceramic bowl. Beside it is a slanted bowl of golden tortilla chips and a small white creamer containing vibrant green salsa verde. Hands reach into the frame to serve and eat. Eucalyptus branches and scattered citrus ingredients are artfully arranged as natural decor. The lighting is warm and directional from the side, highlighting the textures. The composition is a balanced flat lay, with natural, moody colours.",
    },
    StyleDefinition {
        id: "rustic_gathering",
        label: "Rustic Gathering",
        description: "Communal Table",
        auto: false,
        prompt: "An overhead photograph of a rustic summer feast, captured with a 35mm lens at f/4. The scene, shot on a wooden table, features [SUBJECT]. Hands reach into the frame to serve and eat. Food ingredients are artfully arranged as natural décor. The lighting is warm and directional from the side, highlighting textures. The composition is a balanced flat lay, with natural, moody colours.",
    },
    StyleDefinition {
        id: "social_media",
        label: "Social Media",
        description: "Influencer Shot",
        auto: false,
        prompt: "A top-down, flat-lay photograph from directly overhead of a large, wooden communal table filled with food. The scene is bustling with the hands of seven to eight people, each holding a smartphone and actively taking a picture of the [SUBJECT] from above. The phone screens are visible, showing the camera app view. The hands are diverse, featuring various tattoos, painted nails, and different shirt sleeves (flannel, denim, t-shirts). The arrangement of food and hands is dense and dynamic, filling the entire frame. The lighting is bright, even, and diffused from above, creating soft shadows. The entire scene, from the food to the details on the phones and hands, is in sharp focus. The shot is captured with a wide-angle lens.",
    },
    StyleDefinition {
        id: "action_shot",
        label: "Action Shot",
        description: "Eating Moment",
        auto: false,
        prompt: "A top-down, flat-lay photograph from directly overhead, capturing a mid 20s woman in a vibrant blue t-shirt vigorously enjoying [SUBJECT] at a table. The woman has dark hair and is positioned in the lower center of the frame, sitting at a wooden table with deep grain and visible planks. Artfully scattered across the upper two-thirds of the table, flowing towards the plate, is a deconstructed arrangement of fresh ingredients. The lighting is soft, diffused natural daylight coming from the left, highlighting the textures of the old wood, the salt crystals. The focus is sharp across the entire scene, from the table surface to the hair. 50mm lens, f/8.",
    },
    StyleDefinition {
        id: "mediterranean",
        label: "Mediterranean",
        description: "Sunny Tiles",
        auto: false,
        prompt: "A vibrant, top-down flat-lay food photograph of a communal Mediterranean appetizer spread including [SUBJECT], shot directly overhead. The surface is a countertop tiled with light beige square tiles and visible grout. Three hands are active within the frame: one hand wearing a thin gold bracelet holds a glass of sparkling rosé wine, another hand reaches for a spoon. Styling includes matte gold cutlery and dusty rose linen napkins scattered casually. The lighting is bright, sunny, and directional, casting distinct, crisp shadows on the tiles. The colors are highly saturated and fresh. The entire scene is in sharp focus from edge to edge, simulating a 50mm lens at f/11.",
    },
    StyleDefinition {
        id: "lux_dark",
        label: "Lux Dark",
        description: "Jewel Tones",
        auto: false,
        prompt: "A dark and moody, overhead flat lay food photograph with a rustic, luxurious feel. The centrepiece is [SUBJECT] resting on a large, ornate, tarnished dark metal platter. The surface is a deeply textured, matte black slate or concrete background. Arranged around the main platter are three smaller, dark stoneware plates with concentric ring patterns. Two antique silver forks rest on the plates. A crumpled, deep navy blue linen napkin is draped on the right side. The lighting is dramatic chiaroscuro, coming softly from the left, casting gentle shadows and highlighting the textures of the fruit and ceramics, while the edges of the frame fall into deep shadow. Shot on a 50mm lens at f/8. Tactile sharpness across the entire frame, edge-to-edge focus. Rich jewel tone colours.",
    },
    StyleDefinition {
        id: "moody_rustic_macro",
        label: "Moody Rustic",
        description: "Vintage Props",
        auto: false,
        prompt: "A top-down, moody food photograph of [SUBJECT] on a round, dark, rustic wooden serving board. Two vintage silver spoons rest on the board to the right. The board is placed on a larger, dark, distressed wooden table. Scattered artfully around the board are ingredients. In the top-left corner, the edge of an old, dark-covered book is visible. The lighting is soft, directional, and moody, coming from the left, highlighting the textures of the food and wood grain and creating deep, soft shadows. Shot with a 50mm macro lens at f/2.8, ISO 100, to create a shallow depth of field.",
    },
    StyleDefinition {
        id: "abundant_feast",
        label: "Abundant Feast",
        description: "Banquet Style",
        auto: false,
        prompt: "A top-down flat lay photograph of an abundant wooden dining table set for a feast featuring [SUBJECT]. The table is overflowing with various dishes. The table is surrounded by a mix of wooden and rattan chairs. The lighting is diffused overhead, casting soft shadows, with a sharp focus across all the food items. The shot is taken with a wide-angle lens at an f/8 aperture for a deep depth of field.",
    },
    StyleDefinition {
        id: "elegant_moody",
        label: "Elegant Moody",
        description: "Sophisticated",
        auto: false,
        prompt: "A moody, overhead flat-lay food photograph captured with a 50mm lens at f/8. The subject is [SUBJECT]. The plate sits on a heavily textured, dark mottled concrete or aged metal table surface. Surrounding the main plate are props that frame the scene: to the top left, a white enamel pour-over kettle and two dark ceramic mugs filled with coffee; above the plate, a stack of tarnished vintage silver forks; to the right, a large, crumpled dark charcoal linen napkin; in the bottom right, a small bowl of whole peppercorns. Sprigs of fresh thyme and loose grapes are scattered artfully across the dark surface. The lighting is soft, diffused natural daylight coming from the left, creating gentle shadows and highlighting the rich textures. The focus is tack sharp across the entire frame. The overall mood is rustic, organic, and elegant.",
    },
    StyleDefinition {
        id: "gen_enhance",
        label: "Auto Enhance",
        description: "Natural Boost",
        auto: false,
        prompt: "Enhance this photo of [SUBJECT] to look bright, appetizing, and natural. Adjust lighting for soft daylight tones, increase vibrancies of colours without oversaturation, sharpen details, higher structure, and add subtle depth of field. Keep background clean and slightly blurred to emphasize texture and freshness.",
    },
    StyleDefinition {
        id: "menu_look",
        label: "Menu Look",
        description: "Professional Menu",
        auto: false,
        prompt: "Edit this photo of [SUBJECT] for a professional restaurant menu. Enhance color contrast, increase brightness slightly, make whites clean and crisp, and boost texture and shine on the food. Keep the background simple, with a polished but realistic look. Add a slight vignette for focus.",
    },
    StyleDefinition {
        id: "farm_table",
        label: "Farm to Table",
        description: "Organic Vibe",
        auto: false,
        prompt: "Make this image of [SUBJECT] warm and organic. Use natural light tones, slightly desaturated greens, and gentle shadows. Highlight texture and freshness. Avoid harsh contrasts — aim for a cozy, authentic farm-to-table vibe.",
    },
    StyleDefinition {
        id: "insta_style",
        label: "Insta Style",
        description: "Social Ready",
        auto: false,
        prompt: "Edit this photo of [SUBJECT] for Instagram. Boost vibrance and saturation slightly, add clarity and structure, and create a balanced color tone with warm highlights and soft shadows. Keep colors rich but true to life. Add a clean, modern aesthetic.",
    },
    StyleDefinition {
        id: "dark_moody_gen",
        label: "Dark & Moody",
        description: "Cinematic",
        auto: false,
        prompt: "Create a moody, cinematic edit of [SUBJECT]. Darken background, increase contrast and shadows, highlight the food with warm directional light. Enhance rich tones like browns, reds, and golds. Keep it elegant and atmospheric.",
    },
];
