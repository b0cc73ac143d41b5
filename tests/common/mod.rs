pub mod road_scene;
